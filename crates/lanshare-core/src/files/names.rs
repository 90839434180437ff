//! 文件名校验
//!
//! 所有被接受的名字都必须是共享目录下的单个路径分量。

use crate::error::{Result, ShareError};

/// 上传过程中的临时文件前缀，列表中隐藏，不可下载或删除
pub(crate) const UPLOAD_TEMP_PREFIX: &str = ".lanshare-upload-";

/// 校验下载 / 删除请求中的文件名
///
/// 拒绝空字符串、包含 `..`、`/` 或 `\` 的名字。
pub fn validate_file_name(name: &str) -> Result<&str> {
    if name.is_empty()
        || name.contains("..")
        || name.contains(['/', '\\'])
        || has_control_chars(name)
        || is_reserved(name)
    {
        return Err(ShareError::InvalidName);
    }
    Ok(name)
}

/// 从客户端提交的文件名中取出基础名并校验
///
/// 只保留最后一个 `/` 之后的部分，因此 `a..b.txt` 合法，`../x` 变为 `x`。
pub fn sanitize_upload_name(raw: &str) -> Result<String> {
    let trimmed = raw.trim_end_matches('/');
    let base = trimmed.rsplit('/').next().unwrap_or(trimmed);

    if base.is_empty()
        || base == "."
        || base == ".."
        || base.contains('\\')
        || has_control_chars(base)
        || is_reserved(base)
    {
        return Err(ShareError::InvalidName);
    }
    Ok(base.to_string())
}

pub(crate) fn is_reserved(name: &str) -> bool {
    name.starts_with(UPLOAD_TEMP_PREFIX)
}

fn has_control_chars(name: &str) -> bool {
    name.chars().any(char::is_control)
}
