// ============================================================================
// 菜单图标：SVG 文本 → data URL
// ============================================================================

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;

use crate::utils::error::{AppError, AppResult};

const SVG_NS: &str = "xmlns='http://www.w3.org/2000/svg'";
const SVG_DATA_URL_PREFIX: &str = "data:image/svg+xml;base64,";

/// 自定义图标必须是图片 data URL
pub fn is_image_data_url(value: &str) -> bool {
    value.starts_with("data:image/")
}

/// 补齐 xmlns 并压缩空白
pub fn normalize_svg(svg: &str) -> AppResult<String> {
    let with_ns = if svg.contains("xmlns=") {
        svg.to_string()
    } else {
        svg.replacen("<svg", &format!("<svg {}", SVG_NS), 1)
    };

    // 连续空白（含换行）压缩为一个空格
    let re_ws = Regex::new(r"\s+").map_err(|e| AppError::validation(format!("正则编译失败：{}", e)))?;
    Ok(re_ws.replace_all(&with_ns, " ").trim().to_string())
}

/// 把粘贴的 SVG 文本转为 `data:image/svg+xml;base64,...`
///
/// 空文本或不以 `<svg` 开头的文本会被拒绝。
pub fn svg_to_data_url(text: &str) -> AppResult<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("请粘贴 SVG 内容"));
    }
    if !trimmed.starts_with("<svg") {
        return Err(AppError::validation("SVG 内容需以 <svg 开头"));
    }
    let normalized = normalize_svg(trimmed)?;
    Ok(format!("{}{}", SVG_DATA_URL_PREFIX, STANDARD.encode(normalized.as_bytes())))
}
