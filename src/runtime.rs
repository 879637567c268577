//! Scripts installed into every sandbox document.
//!
//! Templates are plain JS with `__PLACEHOLDER__` markers; values are always
//! substituted as JSON literals so user-controlled names cannot break out of
//! the string they land in.

use crate::bridge::{CONSOLE_SOURCE, HOST_SOURCE, NAVIGATION_SOURCE};
use crate::jsx_lowerer::js_string;

// ═══════════════════════════════════════════════════════════════════════════════
// BRIDGE (head)
// ═══════════════════════════════════════════════════════════════════════════════

const BRIDGE_TEMPLATE: &str = r#"(function () {
  var CONSOLE_SOURCE = __CONSOLE_SOURCE__;
  var NAVIGATION_SOURCE = __NAVIGATION_SOURCE__;
  var HOST_SOURCE = __HOST_SOURCE__;
  var PAGES = __PAGES__;
  var preview = window.__PREVIEW__ = window.__PREVIEW__ || {};

  function post(message) {
    try { window.parent.postMessage(message, '*'); } catch (e) { /* detached */ }
  }

  function describe(arg) {
    if (arg instanceof Error) return arg.message;
    if (typeof arg === 'object' && arg !== null) {
      try { return JSON.stringify(arg); } catch (e) { return String(arg); }
    }
    return String(arg);
  }

  function detailsOf(error) {
    var details = { message: error.message, filename: null, lineno: null, colno: null, stack: error.stack || null };
    var match = /([^\s()]+):(\d+):(\d+)\)?\s*$/m.exec(error.stack || '');
    if (match) {
      details.filename = match[1];
      details.lineno = parseInt(match[2], 10);
      details.colno = parseInt(match[3], 10);
    }
    return details;
  }

  var levels = { log: 'log', info: 'info', warn: 'warning', error: 'error' };
  Object.keys(levels).forEach(function (method) {
    var original = console[method];
    console[method] = function () {
      var args = Array.prototype.slice.call(arguments);
      original.apply(console, args);
      var errorArg = null;
      for (var i = 0; i < args.length; i++) {
        if (args[i] instanceof Error) { errorArg = args[i]; break; }
      }
      post({
        source: CONSOLE_SOURCE,
        type: levels[method],
        args: args.map(describe).join(' '),
        errorDetails: errorArg ? detailsOf(errorArg) : null
      });
    };
  });

  var originalClear = console.clear;
  console.clear = function () {
    if (originalClear) originalClear.call(console);
    post({ source: CONSOLE_SOURCE, type: 'clear', args: '' });
  };

  window.onerror = function (message, filename, lineno, colno, error) {
    post({
      source: CONSOLE_SOURCE,
      type: 'error',
      args: String(message),
      errorDetails: {
        message: String(message),
        filename: filename || null,
        lineno: lineno || null,
        colno: colno || null,
        stack: error && error.stack ? error.stack : null
      }
    });
    return true;
  };

  window.addEventListener('unhandledrejection', function (event) {
    var reason = event.reason;
    post({
      source: CONSOLE_SOURCE,
      type: 'error',
      args: 'Unhandled promise rejection: ' + describe(reason),
      errorDetails: reason instanceof Error ? detailsOf(reason) : null
    });
  });

  function pageOf(href) {
    if (!href || href.charAt(0) === '#') return null;
    if (/^[a-z][a-z0-9+.-]*:/i.test(href) || href.indexOf('//') === 0) {
      try {
        var url = new URL(href, window.location.href);
        if (url.origin !== window.location.origin) return null;
        href = url.pathname;
      } catch (e) { return null; }
    }
    var path = href.split(/[?#]/)[0];
    var name = path.split('/').pop();
    if (/\.html?$/i.test(name) || PAGES.indexOf(name) !== -1) return name;
    return null;
  }

  document.addEventListener('click', function (event) {
    var target = event.target;
    var link = target && target.closest ? target.closest('a[href]') : null;
    if (!link || link.target === '_blank') return;
    var page = pageOf(link.getAttribute('href'));
    if (!page) return;
    event.preventDefault();
    event.stopPropagation();
    post({ source: NAVIGATION_SOURCE, action: 'navigate', page: page });
  }, true);

  window.addEventListener('message', function (event) {
    var data = event.data;
    if (!data || data.source !== HOST_SOURCE || data.action !== 'navigate') return;
    if (data.path) {
      if (typeof preview.navigate === 'function') preview.navigate(data.path);
      else preview.pendingPath = data.path;
    } else if (data.page) {
      post({ source: NAVIGATION_SOURCE, action: 'navigate', page: data.page });
    }
  });
})();"#;

// ═══════════════════════════════════════════════════════════════════════════════
// MODULE SHIM (head)
// ═══════════════════════════════════════════════════════════════════════════════

const MODULE_SHIM_TEMPLATE: &str = r#"(function () {
  var preview = window.__PREVIEW__ = window.__PREVIEW__ || {};
  var modules = preview.modules = preview.modules || {};
  var EXTENSIONS = ['.js', '.jsx', '.tsx'];

  function strip(name) {
    return String(name).replace(/^\.?\//, '').replace(/^(\.\.\/)+/, '');
  }

  preview.defineModule = function (path) {
    var exports = modules[path] || {};
    modules[path] = exports;
    return exports;
  };

  preview.require = function (name) {
    var key = strip(name);
    if (modules[key]) return modules[key];
    for (var i = 0; i < EXTENSIONS.length; i++) {
      if (modules[key + EXTENSIONS[i]]) return modules[key + EXTENSIONS[i]];
    }
    var bare = key.replace(/\.[^./]+$/, '');
    var paths = Object.keys(modules);
    for (var j = 0; j < paths.length; j++) {
      if (paths[j].replace(/\.[^./]+$/, '') === bare) return modules[paths[j]];
    }
    for (var k = 0; k < paths.length; k++) {
      var tail = paths[k].split('/').pop().replace(/\.[^.]+$/, '');
      if (tail === bare.split('/').pop()) return modules[paths[k]];
    }
    console.warn('Module not found: ' + name);
    return {};
  };

  preview.requireDefault = function (name) {
    var exports = preview.require(name);
    return exports && Object.prototype.hasOwnProperty.call(exports, 'default') ? exports['default'] : exports;
  };

  window.define = function (name, factory) {
    var exports = preview.defineModule(strip(name));
    var result = factory(exports);
    if (result !== undefined) exports['default'] = result;
  };
  window.require = preview.require;
})();"#;

// ═══════════════════════════════════════════════════════════════════════════════
// ROUTER (body, before components)
// ═══════════════════════════════════════════════════════════════════════════════

const ROUTER_TEMPLATE: &str = r#"(function () {
  var NAVIGATION_SOURCE = __NAVIGATION_SOURCE__;
  var preview = window.__PREVIEW__;
  var router = window.ReactRouterDOM;
  var React = window.React;
  if (!router || !React) return;

  function post(message) {
    try { window.parent.postMessage(message, '*'); } catch (e) { /* detached */ }
  }

  function NavigationCapture() {
    var navigate = router.useNavigate();
    var location = router.useLocation();
    var first = React.useRef(true);
    React.useEffect(function () {
      preview.navigate = function (path) { navigate(path); };
      window.appRouter = { navigate: preview.navigate };
      if (preview.pendingPath) {
        var pending = preview.pendingPath;
        preview.pendingPath = null;
        navigate(pending);
      }
    }, [navigate]);
    React.useEffect(function () {
      if (first.current) { first.current = false; return; }
      post({ source: NAVIGATION_SOURCE, action: 'navigate', path: location.pathname });
    }, [location.pathname]);
    return null;
  }

  function PreviewRouter(props) {
    return React.createElement(
      router.MemoryRouter,
      { initialEntries: [preview.pendingPath || '/'] },
      React.createElement(NavigationCapture, null),
      props.children
    );
  }

  var BaseLink = router.Link;
  var PreviewLink = React.forwardRef(function (props, ref) {
    var to = typeof props.to === 'string' ? props.to : '';
    if (/\.html?($|[?#])/i.test(to)) {
      var rest = Object.assign({}, props, { href: to, ref: ref });
      delete rest.to;
      return React.createElement('a', rest);
    }
    return React.createElement(BaseLink, Object.assign({}, props, { ref: ref }));
  });

  window.ReactRouterDOM = Object.assign({}, router, {
    BrowserRouter: PreviewRouter,
    HashRouter: PreviewRouter,
    Link: PreviewLink
  });
})();"#;

// ═══════════════════════════════════════════════════════════════════════════════
// BOOT (end of body)
// ═══════════════════════════════════════════════════════════════════════════════

const BOOT_TEMPLATE: &str = r#"(function () {
  var ENTRY = __ENTRY__;
  var MOUNT_ID = __MOUNT_ID__;
  var AUTO_MOUNT = __AUTO_MOUNT__;

  function normalizeLinks() {
    var links = document.querySelectorAll('a[href]');
    for (var i = 0; i < links.length; i++) {
      var href = links[i].getAttribute('href');
      if (/^[\w-][\w.-]*\.html?($|[?#])/i.test(href)) links[i].setAttribute('href', './' + href);
    }
  }

  function mount() {
    var Entry = window[ENTRY];
    var root = document.getElementById(MOUNT_ID);
    if (!Entry || !root || !window.React || !window.ReactDOM) return;
    try {
      var element = window.React.createElement(Entry, null);
      if (typeof window.ReactDOM.createRoot === 'function') {
        window.ReactDOM.createRoot(root).render(element);
      } else {
        window.ReactDOM.render(element, root);
      }
    } catch (error) {
      console.error('Error rendering ' + ENTRY + ':', error);
    }
  }

  function boot() {
    normalizeLinks();
    if (AUTO_MOUNT) mount();
  }

  if (document.readyState === 'loading') document.addEventListener('DOMContentLoaded', boot);
  else boot();
})();"#;

/// Console/error/navigation interceptors. `pages` are the markup file names
/// the click interceptor treats as in-project pages.
pub fn bridge_script(pages: &[String]) -> String {
    let pages = serde_json::to_string(pages).unwrap_or_else(|_| "[]".to_string());
    BRIDGE_TEMPLATE
        .replace("__CONSOLE_SOURCE__", &js_string(CONSOLE_SOURCE))
        .replace("__NAVIGATION_SOURCE__", &js_string(NAVIGATION_SOURCE))
        .replace("__HOST_SOURCE__", &js_string(HOST_SOURCE))
        .replace("__PAGES__", &pages)
}

/// `define`/`require` shim backing the script module wrappers.
pub fn module_shim_script() -> String {
    MODULE_SHIM_TEMPLATE.to_string()
}

pub fn router_script() -> String {
    ROUTER_TEMPLATE.replace("__NAVIGATION_SOURCE__", &js_string(NAVIGATION_SOURCE))
}

/// Link normalization plus, when `auto_mount` is set, rendering of the entry
/// component into `#mount_id`.
pub fn boot_script(entry: &str, mount_id: &str, auto_mount: bool) -> String {
    BOOT_TEMPLATE
        .replace("__ENTRY__", &js_string(entry))
        .replace("__MOUNT_ID__", &js_string(mount_id))
        .replace("__AUTO_MOUNT__", if auto_mount { "true" } else { "false" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_are_fully_substituted() {
        let scripts = [
            bridge_script(&["index.html".to_string()]),
            module_shim_script(),
            router_script(),
            boot_script("App", "app", true),
        ];
        for script in &scripts {
            assert!(!script.contains("__CONSOLE_SOURCE__"));
            assert!(!script.contains("__NAVIGATION_SOURCE__"));
            assert!(!script.contains("__HOST_SOURCE__"));
            assert!(!script.contains("__PAGES__"));
            assert!(!script.contains("__ENTRY__"));
            assert!(!script.contains("__MOUNT_ID__"));
            assert!(!script.contains("__AUTO_MOUNT__"));
            assert!(!script.contains("</script"));
        }
    }

    #[test]
    fn test_bridge_uses_envelope_sources() {
        let script = bridge_script(&["about.html".to_string()]);
        assert!(script.contains(r#"var CONSOLE_SOURCE = "preview-console";"#));
        assert!(script.contains(r#"var HOST_SOURCE = "preview-host";"#));
        assert!(script.contains(r#"var PAGES = ["about.html"];"#));
        assert!(script.contains("return true;"));
        assert!(script.contains("}, true);"));
    }

    #[test]
    fn test_boot_script_quotes_values() {
        let script = boot_script("Main", "root\"x", false);
        assert!(script.contains(r#"var ENTRY = "Main";"#));
        assert!(script.contains(r#"var MOUNT_ID = "root\"x";"#));
        assert!(script.contains("var AUTO_MOUNT = false;"));
    }
}
