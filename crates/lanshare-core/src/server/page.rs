//! 首页 HTML 渲染

use crate::files::{FileInfo, format_size};
use std::fmt::Write;

/// 渲染文件列表页面
pub fn render_index(files: &[FileInfo], max_upload_size: u64) -> String {
    let mut rows = String::new();
    for file in files {
        let name = escape_html(&file.name);
        // String 的 fmt::Write 不会失败
        let _ = write!(
            rows,
            r#"
      <tr>
        <td class="name"><a href="/download/{href}" download>{name}</a></td>
        <td class="size">{size}</td>
        <td class="actions">
          <form method="post" action="/delete" class="delete-form">
            <input type="hidden" name="filename" value="{name}">
            <button type="submit" class="danger">Delete</button>
          </form>
        </td>
      </tr>"#,
            href = encode_path_segment(&file.name),
            size = file.display_size(),
        );
    }

    let listing = if files.is_empty() {
        r#"<p class="empty">No files shared yet. Upload one below.</p>"#.to_string()
    } else {
        format!(
            r#"<table class="files">
      <thead><tr><th>Name</th><th>Size</th><th></th></tr></thead>
      <tbody>{rows}
      </tbody>
    </table>"#
        )
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>File Sharing</title>
  <link rel="stylesheet" href="/static/style.css">
</head>
<body>
  <main>
    <h1>📁 Shared Files</h1>
    {listing}
    <section class="upload">
      <h2>📤 Upload</h2>
      <form method="post" action="/upload" enctype="multipart/form-data" id="upload-form">
        <input type="file" name="file" id="file-input" required>
        <button type="submit">Upload</button>
      </form>
      <p class="hint">Max upload size: {max}</p>
    </section>
  </main>
  <script src="/static/app.js"></script>
</body>
</html>
"#,
        max = format_size(max_upload_size),
    )
}

/// 转义 HTML 文本和属性值
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// 对 URL 路径段做百分号编码（保留 RFC 3986 unreserved 字符）
pub fn encode_path_segment(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
            out.push(b as char);
        } else {
            let _ = write!(out, "%{b:02X}");
        }
    }
    out
}
