//! Source generation for the secret viewer program
//!
//! Renders a minimal Windows Forms program whose window title and read-only
//! text box are filled from two strings. The output is plain source text
//! handed to the build toolchain as the project entry point.

use crate::config::WindowConfig;

/// Escape a string for embedding inside a regular double-quoted literal.
///
/// Only backslash, double quote, carriage return and line feed are rewritten.
/// Anything else is passed through and left for the compiler to judge.
#[must_use]
pub fn escape_literal(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\r' => escaped.push_str("\\r"),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render the program with the default window size
#[must_use]
pub fn render(title: &str, body: &str) -> String {
    render_with(title, body, WindowConfig::default())
}

/// Render the program source for `title` / `body` in a `window`-sized form
#[must_use]
pub fn render_with(title: &str, body: &str, window: WindowConfig) -> String {
    let title = escape_literal(title);
    let body = escape_literal(body);
    let width = window.width;
    let height = window.height;

    format!(
        r#"using System;
using System.Windows.Forms;

class Program
{{
    [STAThread]
    static void Main()
    {{
        Application.EnableVisualStyles();
        Application.Run(new Form
        {{
            Text = "{title}",
            Width = {width},
            Height = {height},
            Controls =
            {{
                new TextBox
                {{
                    Multiline = true,
                    ReadOnly = true,
                    Dock = DockStyle.Fill,
                    ScrollBars = ScrollBars.Vertical,
                    Text = "{body}"
                }}
            }}
        }});
    }}
}}
"#
    )
}
