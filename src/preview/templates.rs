//! Document templates for the three preview languages.
//!
//! Placeholders are `{{name}}` tokens filled by [`fill`]; substituted values
//! are never re-scanned, so generated code containing `{{...}}` is inserted
//! literally.

/// Minimal shell for markup fragments.
pub const MARKUP_SHELL: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{{title}}</title>
</head>
<body>
{{code}}
</body>
</html>
"##;

/// Stylesheet demonstration document. The body is a fixed fixture so that
/// partial stylesheets still have something to style.
pub const STYLESHEET_DEMO: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{{title}}</title>
<style>
{{code}}
</style>
</head>
<body>
<h1>Sample Heading</h1>
<p>This paragraph is sample body text so that typography rules have something to style.</p>
<button type="button">Sample Button</button>
<div class="box" id="box">
<label for="sample-input">Labelled div</label>
<input id="sample-input" type="text" placeholder="Sample input">
</div>
<a href="#">Sample link</a>
</body>
</html>
"##;

/// Script harness document: an output region, console capture, a top-level
/// error handler and the guarded execution of `{{source}}` (a JSON string).
pub const SCRIPT_HARNESS: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{{title}}</title>
<style>
body { margin: 0; padding: 12px; background: #0d1117; color: #c9d1d9; font-family: ui-monospace, 'Cascadia Code', 'Fira Code', monospace; font-size: 13px; }
#preview-output .line { white-space: pre-wrap; word-wrap: break-word; padding: 3px 0; border-bottom: 1px solid #21262d; }
#preview-output .warn { color: #e3b341; }
#preview-output .error { color: #f85149; }
</style>
</head>
<body>
<div id="preview-output"></div>
<script>
(function () {
  var output = document.getElementById('preview-output');

  function format(value) {
    if (value instanceof Error) {
      return value.name + ': ' + value.message;
    }
    if (value !== null && typeof value === 'object') {
      try {
        return JSON.stringify(value, null, 2);
      } catch (e) {
        return String(value);
      }
    }
    return String(value);
  }

  function append(kind, args) {
    var line = document.createElement('div');
    line.className = 'line ' + kind;
    line.textContent = Array.prototype.map.call(args, format).join(' ');
    output.appendChild(line);
  }

  ['log', 'info', 'warn', 'error', 'debug'].forEach(function (method) {
    var original = console[method];
    console[method] = function () {
      append(method, arguments);
      if (typeof original === 'function') {
        original.apply(console, arguments);
      }
    };
  });

  window.addEventListener('error', function (event) {
    var where = event.lineno ? ' (line ' + event.lineno + ')' : '';
    append('error', ['Uncaught ' + (event.error ? format(event.error) : event.message) + where]);
    event.preventDefault();
  });

  window.addEventListener('unhandledrejection', function (event) {
    append('error', ['Unhandled rejection: ' + format(event.reason)]);
    event.preventDefault();
  });

  try {
    (0, eval)({{source}});
  } catch (err) {
    append('error', ['Uncaught ' + format(err)]);
  }
})();
</script>
</body>
</html>
"##;

/// Fill `{{name}}` placeholders in a single pass. Unknown placeholders are
/// kept as-is.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let extra: usize = values.iter().map(|(_, v)| v.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            out.push_str(&rest[open..]);
            return out;
        };

        let key = &after[..close];
        match values.iter().find(|(k, _)| *k == key) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[open..open + 2 + close + 2]),
        }
        rest = &after[close + 2..];
    }

    out.push_str(rest);
    out
}
