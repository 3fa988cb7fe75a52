//! HTML for directory listings.
//!
//! Untrusted text (file names, request paths) only enters the page through
//! [`Html::text`] and [`Html::attr`], which bound its length and escape it.

use std::fmt::Write;

use crate::files::listing::DirectoryEntry;
use crate::http::router::{DELETE_PREFIX, FILE_PREFIX};

/// Longest file name shown in a row, in characters.
pub const MAX_NAME_CHARS: usize = 200;
/// Longest URL placed in an `href`, in characters.
pub const MAX_URL_CHARS: usize = 700;

const TITLE: &str = "Falcon File Manager";

const STYLE: &str = "body{font-family:monospace;background:#f5f5f5;color:#111;padding:16px;margin:0;}\
.layout{display:flex;gap:16px;align-items:flex-start;}\
.pane{flex:1;background:#fff;border:1px solid #ddd;border-radius:6px;padding:12px;}\
table{border-collapse:collapse;width:100%;}\
th,td{border-bottom:1px solid #eee;padding:6px;text-align:left;}\
a{color:#004fa3;text-decoration:none;}a:hover{text-decoration:underline;}\
#console-log{background:#0b0b0b;color:#00e676;height:320px;overflow:auto;padding:8px;white-space:pre-wrap;}\
#console-input{width:100%;box-sizing:border-box;padding:6px;margin-top:6px;font-family:monospace;}";

const SCRIPT: &str = "const currentPath=document.body.dataset.path||'/';\
document.getElementById('upload-form').addEventListener('submit',async(e)=>{e.preventDefault();\
const f=document.getElementById('upload-file').files[0];if(!f){alert('Choose a file first');return;}\
const base=currentPath.endsWith('/')?currentPath:currentPath+'/';\
const res=await fetch('/upload'+base+encodeURIComponent(f.name),{method:'PUT',body:f});\
if(res.ok){location.reload();}else{alert('Upload failed: '+res.status);}});\
const clog=document.getElementById('console-log');\
function appendLog(t){clog.textContent+=t+'\\n';clog.scrollTop=clog.scrollHeight;}\
document.getElementById('console-form').addEventListener('submit',async(e)=>{e.preventDefault();\
const input=document.getElementById('console-input');const cmd=input.value.trim();if(!cmd){return;}\
appendLog('> '+cmd);input.value='';\
const res=await fetch('/exec',{method:'POST',body:new TextEncoder().encode(cmd)});appendLog(await res.text());});";

/// Accumulates a page. Static markup goes in with [`Html::raw`].
#[derive(Debug, Default)]
pub struct Html {
    buf: String,
}

impl Html {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&mut self, markup: &str) -> &mut Self {
        self.buf.push_str(markup);
        self
    }

    /// Escaped text content, cut to `max_chars`.
    pub fn text(&mut self, value: &str, max_chars: usize) -> &mut Self {
        escape_into(&mut self.buf, truncate_chars(value, max_chars));
        self
    }

    /// A complete ` name="value"` attribute with the value escaped and cut
    /// to `max_chars`. `name` is static markup.
    pub fn attr(&mut self, name: &str, value: &str, max_chars: usize) -> &mut Self {
        self.buf.push(' ');
        self.buf.push_str(name);
        self.buf.push_str("=\"");
        self.text(value, max_chars);
        self.buf.push('"');
        self
    }

    pub fn number(&mut self, value: u64) -> &mut Self {
        // Writing to a String cannot fail.
        let _ = write!(self.buf, "{value}");
        self
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

/// Cuts `value` to at most `max` characters.
pub fn truncate_chars(value: &str, max: usize) -> &str {
    match value.char_indices().nth(max) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

fn escape_into(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

/// URL of the directory above `current`.
///
/// At most one trailing slash is ignored, then the URL is cut after the
/// previous `/`. Anything that would leave only the root maps to `/`.
pub fn parent_url(current: &str) -> String {
    if current.is_empty() || current == "/" {
        return "/".to_string();
    }

    let trimmed = current.strip_suffix('/').unwrap_or(current);
    match trimmed.rfind('/') {
        Some(idx) if idx > 0 => trimmed[..=idx].to_string(),
        _ => "/".to_string(),
    }
}

/// URL of `name` inside the listing at `current`. Directory URLs get a
/// trailing slash.
pub fn child_url(current: &str, name: &str, is_dir: bool) -> String {
    let base = if current.is_empty() { "/" } else { current };
    let mut url = String::with_capacity(base.len() + name.len() + 2);
    url.push_str(base);
    if !base.ends_with('/') {
        url.push('/');
    }
    url.push_str(&urlencoding::encode(name));
    if is_dir {
        url.push('/');
    }
    url
}

/// `/file` or `/delete` in front of a child URL.
fn action_url(prefix: &str, child: &str) -> String {
    format!("{}{child}", prefix.trim_end_matches('/'))
}

/// Renders a full listing page for the sorted `entries` of `current_url`.
pub fn render_listing(current_url: &str, entries: &[DirectoryEntry]) -> String {
    let current = if current_url.is_empty() { "/" } else { current_url };

    let mut page = Html::new();
    page.raw("<!doctype html><html><head><meta charset=\"utf-8\"><title>")
        .raw(TITLE)
        .raw("</title><style>")
        .raw(STYLE)
        .raw("</style></head><body")
        .attr("data-path", current, MAX_URL_CHARS)
        .raw("><div class=\"layout\"><div class=\"pane\"><h1>")
        .raw(TITLE)
        .raw(" &mdash; ")
        .text(current, MAX_URL_CHARS)
        .raw("</h1><form id=\"upload-form\"><input type=\"file\" id=\"upload-file\"/>")
        .raw("<button type=\"submit\">Upload</button></form><p>Listing directory: <code>")
        .text(current, MAX_URL_CHARS)
        .raw("</code></p><table id=\"file-table\">")
        .raw("<tr><th>Name</th><th>Size (bytes)</th><th>Actions</th></tr>");

    page.raw("<tr><td><a")
        .attr("href", &parent_url(current), MAX_URL_CHARS)
        .raw(">..</a></td><td>-</td><td></td></tr>");

    for entry in entries {
        let child = child_url(current, &entry.name, entry.is_dir);
        if entry.is_dir {
            page.raw("<tr><td><a")
                .attr("href", &child, MAX_URL_CHARS)
                .raw(">")
                .text(&entry.name, MAX_NAME_CHARS)
                .raw("/</a></td><td>-</td><td></td></tr>");
        } else {
            page.raw("<tr><td>")
                .text(&entry.name, MAX_NAME_CHARS)
                .raw("</td><td>")
                .number(entry.size)
                .raw("</td><td><a")
                .attr("href", &action_url(FILE_PREFIX, &child), MAX_URL_CHARS)
                .raw(">download</a> | <a")
                .attr("href", &action_url(DELETE_PREFIX, &child), MAX_URL_CHARS)
                .raw(">delete</a></td></tr>");
        }
    }

    page.raw("</table><p>Upload from a shell: <code>curl -T file.bin http://&lt;host&gt;/upload/path/file.bin</code></p></div>")
        .raw("<div class=\"pane\"><h2>Remote Terminal</h2><div id=\"console-log\"></div>")
        .raw("<form id=\"console-form\"><input id=\"console-input\" type=\"text\" placeholder=\"Command\" autocomplete=\"off\"/>")
        .raw("<button type=\"submit\">Run</button></form></div></div><script>")
        .raw(SCRIPT)
        .raw("</script></body></html>");

    page.finish()
}
