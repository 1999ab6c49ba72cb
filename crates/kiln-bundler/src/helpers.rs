//! Runtime for the helper calls oxc emits while lowering syntax.
//!
//! Lowered modules call helpers as `babelHelpers.<name>(...)`. The bundle
//! defines that object once, ahead of the module registry, when any module
//! refers to it.

/// Global the lowered code calls helpers through.
pub const HELPERS_GLOBAL: &str = "babelHelpers";

/// Whether a compiled module body calls any helper.
pub fn uses_helpers(code: &str) -> bool {
    code.contains("babelHelpers.")
}

/// Helper definitions, in ES5.
pub const HELPERS: &str = r#"var babelHelpers = (function () {
function toPrimitive(t, r) {
  if (typeof t !== "object" || t === null) { return t; }
  var e = typeof Symbol === "function" ? t[Symbol.toPrimitive] : undefined;
  if (e !== undefined) {
    var i = e.call(t, r || "default");
    if (typeof i !== "object") { return i; }
    throw new TypeError("@@toPrimitive must return a primitive value.");
  }
  return (r === "string" ? String : Number)(t);
}
function toPropertyKey(t) {
  var i = toPrimitive(t, "string");
  return typeof i === "symbol" ? i : i + "";
}
function defineProperty(e, r, t) {
  r = toPropertyKey(r);
  if (r in e) {
    Object.defineProperty(e, r, { value: t, enumerable: true, configurable: true, writable: true });
  } else {
    e[r] = t;
  }
  return e;
}
function ownKeys(e, r) {
  var t = Object.keys(e);
  if (Object.getOwnPropertySymbols) {
    var o = Object.getOwnPropertySymbols(e);
    if (r) { o = o.filter(function (k) { return Object.getOwnPropertyDescriptor(e, k).enumerable; }); }
    t.push.apply(t, o);
  }
  return t;
}
function objectSpread2(e) {
  for (var r = 1; r < arguments.length; r++) {
    var t = arguments[r] != null ? arguments[r] : {};
    if (r % 2) {
      ownKeys(Object(t), true).forEach(function (k) { defineProperty(e, k, t[k]); });
    } else if (Object.getOwnPropertyDescriptors) {
      Object.defineProperties(e, Object.getOwnPropertyDescriptors(t));
    } else {
      ownKeys(Object(t)).forEach(function (k) { Object.defineProperty(e, k, Object.getOwnPropertyDescriptor(t, k)); });
    }
  }
  return e;
}
function _extends() {
  var assign = Object.assign || function (n) {
    for (var e = 1; e < arguments.length; e++) {
      var t = arguments[e];
      for (var r in t) { if (Object.prototype.hasOwnProperty.call(t, r)) { n[r] = t[r]; } }
    }
    return n;
  };
  return assign.apply(null, arguments);
}
function objectDestructuringEmpty(t) {
  if (t == null) { throw new TypeError("Cannot destructure " + t); }
}
function objectWithoutPropertiesLoose(r, e) {
  if (r == null) { return {}; }
  var t = {};
  for (var n in r) {
    if (Object.prototype.hasOwnProperty.call(r, n)) {
      if (e.indexOf(n) !== -1) { continue; }
      t[n] = r[n];
    }
  }
  return t;
}
function objectWithoutProperties(e, t) {
  if (e == null) { return {}; }
  var i = objectWithoutPropertiesLoose(e, t);
  if (Object.getOwnPropertySymbols) {
    var s = Object.getOwnPropertySymbols(e);
    for (var r = 0; r < s.length; r++) {
      var o = s[r];
      if (t.indexOf(o) === -1 && Object.prototype.propertyIsEnumerable.call(e, o)) { i[o] = e[o]; }
    }
  }
  return i;
}
function asyncGeneratorStep(n, t, e, r, o, a, c) {
  var i, u;
  try {
    i = n[a](c);
    u = i.value;
  } catch (err) {
    e(err);
    return;
  }
  if (i.done) { t(u); } else { Promise.resolve(u).then(r, o); }
}
function asyncToGenerator(n) {
  return function () {
    var t = this, e = arguments;
    return new Promise(function (r, o) {
      var a = n.apply(t, e);
      function next(v) { asyncGeneratorStep(a, r, o, next, thrown, "next", v); }
      function thrown(v) { asyncGeneratorStep(a, r, o, next, thrown, "throw", v); }
      next(undefined);
    });
  };
}
function OverloadYield(e, d) { this.v = e; this.k = d; }
function awaitAsyncGenerator(e) { return new OverloadYield(e, 0); }
function AsyncGenerator(e) {
  var front, back;
  function settle(kind, value) {
    if (kind === "return") {
      front.resolve({ value: value, done: true });
    } else if (kind === "throw") {
      front.reject(value);
    } else {
      front.resolve({ value: value, done: false });
    }
    front = front.next;
    if (front) { resume(front.key, front.arg); } else { back = null; }
  }
  function resume(key, arg) {
    try {
      var result = e[key](arg), value = result.value, overloaded = value instanceof OverloadYield;
      Promise.resolve(overloaded ? value.v : value).then(function (v) {
        if (overloaded) {
          var nextKey = key === "return" ? "return" : "next";
          if (!value.k || v.done) { return resume(nextKey, v); }
          v = e[nextKey](v).value;
        }
        settle(result.done ? "return" : "normal", v);
      }, function (err) { resume("throw", err); });
    } catch (err) {
      settle("throw", err);
    }
  }
  this._invoke = function (key, arg) {
    return new Promise(function (resolve, reject) {
      var request = { key: key, arg: arg, resolve: resolve, reject: reject, next: null };
      if (back) {
        back = back.next = request;
      } else {
        front = back = request;
        resume(key, arg);
      }
    });
  };
  if (typeof e["return"] !== "function") { this["return"] = undefined; }
}
AsyncGenerator.prototype[typeof Symbol === "function" && Symbol.asyncIterator || "@@asyncIterator"] = function () { return this; };
AsyncGenerator.prototype.next = function (e) { return this._invoke("next", e); };
AsyncGenerator.prototype["throw"] = function (e) { return this._invoke("throw", e); };
AsyncGenerator.prototype["return"] = function (e) { return this._invoke("return", e); };
function wrapAsyncGenerator(e) {
  return function () { return new AsyncGenerator(e.apply(this, arguments)); };
}
function AsyncFromSyncIterator(s) { this.s = s; this.n = s.next; }
function asyncFromSyncContinuation(r) {
  if (Object(r) !== r) { return Promise.reject(new TypeError(r + " is not an object.")); }
  var done = r.done;
  return Promise.resolve(r.value).then(function (v) { return { value: v, done: done }; });
}
AsyncFromSyncIterator.prototype.next = function () {
  return asyncFromSyncContinuation(this.n.apply(this.s, arguments));
};
AsyncFromSyncIterator.prototype["return"] = function (v) {
  var r = this.s["return"];
  return r === undefined ? Promise.resolve({ value: v, done: true }) : asyncFromSyncContinuation(r.apply(this.s, arguments));
};
AsyncFromSyncIterator.prototype["throw"] = function (v) {
  var r = this.s["return"];
  return r === undefined ? Promise.reject(v) : asyncFromSyncContinuation(r.apply(this.s, arguments));
};
function asyncIterator(r) {
  var method, async, sync, tries = 2;
  if (typeof Symbol !== "undefined") { async = Symbol.asyncIterator; sync = Symbol.iterator; }
  while (tries--) {
    if (async && (method = r[async]) != null) { return method.call(r); }
    if (sync && (method = r[sync]) != null) { return new AsyncFromSyncIterator(method.call(r)); }
    async = "@@asyncIterator";
    sync = "@@iterator";
  }
  throw new TypeError("Object is not async iterable");
}
function asyncGeneratorDelegate(t) {
  var e = {}, waiting = false;
  function pump(key, value) {
    waiting = true;
    value = new Promise(function (resolve) { resolve(t[key](value)); });
    return { done: false, value: new OverloadYield(value, 1) };
  }
  e[typeof Symbol !== "undefined" && Symbol.iterator || "@@iterator"] = function () { return this; };
  e.next = function (v) {
    if (waiting) { waiting = false; return v; }
    return pump("next", v);
  };
  if (typeof t["throw"] === "function") {
    e["throw"] = function (v) {
      if (waiting) { waiting = false; throw v; }
      return pump("throw", v);
    };
  }
  if (typeof t["return"] === "function") {
    e["return"] = function (v) {
      if (waiting) { waiting = false; return v; }
      return pump("return", v);
    };
  }
  return e;
}
function checkPrivateRedeclaration(e, t) {
  if (t.has(e)) { throw new TypeError("Cannot initialize the same private elements twice on an object"); }
}
function classPrivateFieldInitSpec(e, t, a) { checkPrivateRedeclaration(e, t); t.set(e, a); }
function classPrivateMethodInitSpec(e, a) { checkPrivateRedeclaration(e, a); a.add(e); }
function assertClassBrand(e, t, n) {
  if (typeof e === "function" ? e === t : e.has(t)) { return arguments.length < 3 ? t : n; }
  throw new TypeError("Private element is not present on this object");
}
function classPrivateFieldGet2(s, a) { return s.get(assertClassBrand(s, a)); }
function classPrivateFieldSet2(s, a, r) { s.set(assertClassBrand(s, a), r); return r; }
var privateLooseId = 0;
function classPrivateFieldLooseKey(e) { return "__private_" + privateLooseId++ + "_" + e; }
function classPrivateFieldLooseBase(e, t) {
  if (!Object.prototype.hasOwnProperty.call(e, t)) { throw new TypeError("attempted to use private field on non-instance"); }
  return e;
}
function toSetter(t, e, n) {
  if (!e) { e = []; }
  var r = e.length++;
  return Object.defineProperty({}, "_", { set: function (o) { e[r] = o; t.apply(n, e); } });
}
function checkInRHS(e) {
  if (Object(e) !== e) {
    throw new TypeError("right-hand side of 'in' should be an object, got " + (e !== null ? typeof e : "null"));
  }
  return e;
}
function readOnlyError(r) { throw new TypeError("\"" + r + "\" is read-only"); }
function writeOnlyError(r) { throw new TypeError("\"" + r + "\" is write-only"); }
function superPropBase(t, o) {
  while (!Object.prototype.hasOwnProperty.call(t, o)) {
    t = Object.getPrototypeOf(t);
    if (t === null) { break; }
  }
  return t;
}
function superGet(e, t, r) {
  var base = superPropBase(e, t);
  if (!base) { return undefined; }
  var desc = Object.getOwnPropertyDescriptor(base, t);
  return desc.get ? desc.get.call(r) : desc.value;
}
function superPropGet(t, o, e, r) {
  var p = superGet(Object.getPrototypeOf(r & 1 ? t.prototype : t), o, e);
  return r & 2 && typeof p === "function" ? function (args) { return p.apply(e, args); } : p;
}
function superSet(target, property, value, receiver) {
  var base = superPropBase(target, property), desc;
  if (base) {
    desc = Object.getOwnPropertyDescriptor(base, property);
    if (desc.set) { desc.set.call(receiver, value); return true; }
    if (!desc.writable) { return false; }
  }
  desc = Object.getOwnPropertyDescriptor(receiver, property);
  if (desc) {
    if (!desc.writable) { return false; }
    desc.value = value;
    Object.defineProperty(receiver, property, desc);
  } else {
    defineProperty(receiver, property, value);
  }
  return true;
}
function superPropSet(t, e, o, r, p, f) {
  if (!superSet(Object.getPrototypeOf(f ? t.prototype : t), e, o, r) && p) {
    throw new TypeError("failed to set property");
  }
  return o;
}
return {
  toPrimitive: toPrimitive,
  toPropertyKey: toPropertyKey,
  defineProperty: defineProperty,
  objectSpread2: objectSpread2,
  "extends": _extends,
  objectDestructuringEmpty: objectDestructuringEmpty,
  objectWithoutProperties: objectWithoutProperties,
  objectWithoutPropertiesLoose: objectWithoutPropertiesLoose,
  asyncToGenerator: asyncToGenerator,
  awaitAsyncGenerator: awaitAsyncGenerator,
  wrapAsyncGenerator: wrapAsyncGenerator,
  asyncIterator: asyncIterator,
  asyncGeneratorDelegate: asyncGeneratorDelegate,
  classPrivateFieldInitSpec: classPrivateFieldInitSpec,
  classPrivateMethodInitSpec: classPrivateMethodInitSpec,
  assertClassBrand: assertClassBrand,
  classPrivateFieldGet2: classPrivateFieldGet2,
  classPrivateFieldSet2: classPrivateFieldSet2,
  classPrivateFieldLooseKey: classPrivateFieldLooseKey,
  classPrivateFieldLooseBase: classPrivateFieldLooseBase,
  toSetter: toSetter,
  checkInRHS: checkInRHS,
  readOnlyError: readOnlyError,
  writeOnlyError: writeOnlyError,
  superPropGet: superPropGet,
  superPropSet: superPropSet
};
})();
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    #[test]
    fn helpers_parse_as_classic_script() {
        let allocator = Allocator::default();
        let parsed = Parser::new(&allocator, HELPERS, SourceType::default().with_module(false))
            .parse();

        assert!(parsed.errors.is_empty());
        assert!(HELPERS.starts_with(&format!("var {} =", HELPERS_GLOBAL)));
    }

    #[test]
    fn detects_helper_calls() {
        assert!(uses_helpers("var a = babelHelpers.objectSpread2({}, b);"));
        assert!(!uses_helpers("var a = Object.assign({}, b);"));
    }
}
