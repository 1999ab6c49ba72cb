//! Live reload over WebSockets.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// WebSocket endpoint browsers connect to.
pub const RELOAD_SOCKET_PATH: &str = "/__kiln/reload";

/// Path the client script is served from.
pub const RELOAD_SCRIPT_PATH: &str = "/__kiln/reload.js";

/// Messages sent to connected browsers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReloadMessage {
    /// Reload the page
    Reload,

    /// Connection established
    Connected,
}

/// Broadcasts reload messages to every connected client.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    sender: broadcast::Sender<ReloadMessage>,
}

impl ReloadHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    pub fn send(&self, msg: ReloadMessage) {
        // No connected browsers is fine
        let _ = self.sender.send(msg);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Browser side of live reload.
///
/// Connects back to whatever host served the page, so the script does not
/// depend on the bound address.
pub fn reload_client_script() -> String {
    format!(
        r#"(function() {{
  'use strict';

  var protocol = location.protocol === 'https:' ? 'wss://' : 'ws://';
  var retries = 0;

  function connect() {{
    var ws = new WebSocket(protocol + location.host + '{}');

    ws.onopen = function() {{
      if (retries > 0) {{
        location.reload();
      }}
      retries = 0;
    }};

    ws.onmessage = function(event) {{
      var msg = JSON.parse(event.data);
      if (msg.type === 'reload') {{
        location.reload();
      }}
    }};

    ws.onclose = function() {{
      if (retries < 10) {{
        retries++;
        setTimeout(connect, 1000 * retries);
      }}
    }};
  }}

  connect();
}})();
"#,
        RELOAD_SOCKET_PATH
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_broadcasts_messages() {
        let hub = ReloadHub::new();
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();

        hub.send(ReloadMessage::Reload);

        assert_eq!(first.try_recv().unwrap(), ReloadMessage::Reload);
        assert_eq!(second.try_recv().unwrap(), ReloadMessage::Reload);
        assert_eq!(hub.subscriber_count(), 2);
    }

    #[test]
    fn sending_without_clients_is_fine() {
        ReloadHub::new().send(ReloadMessage::Reload);
    }

    #[test]
    fn serializes_messages() {
        assert_eq!(
            serde_json::to_string(&ReloadMessage::Reload).unwrap(),
            r#"{"type":"reload"}"#
        );
    }

    #[test]
    fn client_script_targets_reload_socket() {
        assert!(reload_client_script().contains("'/__kiln/reload'"));
    }
}
