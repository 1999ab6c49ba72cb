//! Click handler for the header's callback link.
//!
//! The browser side lives in `components/main-header/main-header.js` (written
//! by `kiln init`). This crate pins down what that handler does, with the DOM,
//! the modal library and the input mask behind traits.

/// Selector of the element whose markup becomes the dialog content.
pub const CALLBACK_SELECTOR: &str = "[data-modal=callback]";

/// Class of the dialog's close button.
pub const CLOSE_CLASS: &str = "modal__close";

/// A click on the callback link.
pub trait ClickEvent {
    /// Stop the browser from following the link.
    fn prevent_default(&mut self);
}

/// Read access to the current page.
pub trait Document {
    /// Inner markup of the first element matching `selector`.
    fn inner_html(&self, selector: &str) -> Option<String>;
}

/// What the modal host is asked to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalOptions {
    /// Markup placed in the dialog, unescaped
    pub content: String,

    /// Elements with this class close the dialog
    pub close_class: String,
}

/// The modal library.
pub trait ModalHost {
    /// Show a dialog and call `after_open` once it is mounted.
    fn open(&mut self, options: ModalOptions, after_open: &mut dyn FnMut());
}

/// Input masking applied to the callback form.
pub trait InputMask {
    fn mask(&mut self);
}

/// Result of handling a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Opened,
    MissingContent,
}

/// Open the callback form in a dialog.
///
/// Navigation is always prevented. When the page has no callback markup the
/// click is logged as an error and no dialog is opened.
pub fn on_callback_link_click(
    event: &mut dyn ClickEvent,
    document: &dyn Document,
    host: &mut dyn ModalHost,
    mask: &mut dyn InputMask,
) -> ClickOutcome {
    event.prevent_default();
    tracing::debug!("Callback link clicked");

    let Some(content) = document.inner_html(CALLBACK_SELECTOR) else {
        tracing::error!("Modal content {} does not exist", CALLBACK_SELECTOR);
        return ClickOutcome::MissingContent;
    };

    host.open(
        ModalOptions {
            content,
            close_class: CLOSE_CLASS.to_string(),
        },
        &mut || mask.mask(),
    );
    ClickOutcome::Opened
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// Log sink shared between a test and its subscriber.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[derive(Default)]
    struct Click {
        prevented: bool,
    }

    impl ClickEvent for Click {
        fn prevent_default(&mut self) {
            self.prevented = true;
        }
    }

    #[derive(Default)]
    struct Page(HashMap<&'static str, &'static str>);

    impl Document for Page {
        fn inner_html(&self, selector: &str) -> Option<String> {
            self.0.get(selector).map(|html| html.to_string())
        }
    }

    /// Records what happens, in order.
    #[derive(Default)]
    struct Log(Vec<String>);

    struct Host<'a> {
        log: &'a std::cell::RefCell<Log>,
        opened: Vec<ModalOptions>,
    }

    impl ModalHost for Host<'_> {
        fn open(&mut self, options: ModalOptions, after_open: &mut dyn FnMut()) {
            self.log.borrow_mut().0.push("mounted".to_string());
            self.opened.push(options);
            after_open();
        }
    }

    struct Mask<'a> {
        log: &'a std::cell::RefCell<Log>,
    }

    impl InputMask for Mask<'_> {
        fn mask(&mut self) {
            self.log.borrow_mut().0.push("masked".to_string());
        }
    }

    #[test]
    fn missing_content_opens_nothing() {
        let log = std::cell::RefCell::new(Log::default());
        let mut click = Click::default();
        let mut host = Host {
            log: &log,
            opened: vec![],
        };
        let mut mask = Mask { log: &log };
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let outcome = tracing::subscriber::with_default(subscriber, || {
            on_callback_link_click(&mut click, &Page::default(), &mut host, &mut mask)
        });

        assert_eq!(outcome, ClickOutcome::MissingContent);
        assert!(click.prevented);
        assert!(host.opened.is_empty());
        assert!(log.borrow().0.is_empty());

        let logged = captured.text();
        assert!(logged.contains("ERROR"));
        assert!(logged.contains("Modal content [data-modal=callback] does not exist"));
    }

    #[test]
    fn opens_dialog_then_masks_inputs() {
        let log = std::cell::RefCell::new(Log::default());
        let mut click = Click::default();
        let page = Page(HashMap::from([(CALLBACK_SELECTOR, "<form>phone</form>")]));
        let mut host = Host {
            log: &log,
            opened: vec![],
        };
        let mut mask = Mask { log: &log };

        let outcome = on_callback_link_click(&mut click, &page, &mut host, &mut mask);

        assert_eq!(outcome, ClickOutcome::Opened);
        assert!(click.prevented);
        assert_eq!(
            host.opened,
            vec![ModalOptions {
                content: "<form>phone</form>".to_string(),
                close_class: "modal__close".to_string(),
            }]
        );
        assert_eq!(log.borrow().0, vec!["mounted", "masked"]);
    }
}
