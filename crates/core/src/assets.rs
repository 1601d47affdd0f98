//! File rules for uploaded and externally linked assets.

use std::collections::BTreeMap;

use crate::error::CoreError;
use crate::production::{
    ASSET_CATEGORY_CONTRACT, ASSET_CATEGORY_MASTER_VIDEO, ASSET_CATEGORY_OTHER,
    ASSET_CATEGORY_PREVIEW_VIDEO, ASSET_CATEGORY_SCRIPT, LINK_TYPE_DROPBOX,
    LINK_TYPE_GOOGLE_DRIVE, LINK_TYPE_ONEDRIVE, LINK_TYPE_OTHER, LINK_TYPE_VIMEO,
    LINK_TYPE_YOUTUBE,
};

/// Maximum stored length of an external URL (`VARCHAR(500)`).
pub const MAX_EXTERNAL_URL_LEN: usize = 500;

/// Extensions accepted when the upload names no known category.
pub const COMMON_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "txt", "mp4", "mov", "avi", "mkv", "jpg", "jpeg", "png", "gif", "zip",
    "rar",
];

/// Extensions accepted for a given asset category.
pub fn allowed_extensions(category: &str) -> Option<&'static [&'static str]> {
    let exts: &'static [&'static str] = match category {
        ASSET_CATEGORY_SCRIPT => &["pdf", "doc", "docx", "txt"],
        ASSET_CATEGORY_CONTRACT => &["pdf", "doc", "docx"],
        ASSET_CATEGORY_PREVIEW_VIDEO => &["mp4", "mov", "avi", "mkv", "webm"],
        ASSET_CATEGORY_MASTER_VIDEO => &["mp4", "mov", "avi", "mkv", "mxf", "prores"],
        ASSET_CATEGORY_OTHER => &[
            "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "zip", "rar", "jpg", "jpeg", "png",
        ],
        _ => return None,
    };
    Some(exts)
}

/// Lower-cased extension of a file name, without the dot.
pub fn file_extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Reject uploads whose extension is not allowed for `category`.
pub fn validate_upload_extension(file_name: &str, category: Option<&str>) -> Result<(), CoreError> {
    let ext = file_extension(file_name).unwrap_or_default();

    match category.and_then(allowed_extensions) {
        Some(allowed) if allowed.contains(&ext.as_str()) => Ok(()),
        Some(_) => Err(CoreError::Validation(format!(
            "File type .{ext} not allowed for category {}",
            category.unwrap_or_default()
        ))),
        None if COMMON_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        None => Err(CoreError::Validation(format!("File type .{ext} not allowed"))),
    }
}

/// Replace every non-alphanumeric character with `_` and lower-case the result.
pub fn sanitize_stem(stem: &str) -> String {
    stem.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Build the on-disk file name `<sanitized-stem>-<unique>.<ext>`.
pub fn stored_file_name(original: &str, unique: &str) -> String {
    match original.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            format!("{}-{unique}.{}", sanitize_stem(stem), ext.to_ascii_lowercase())
        }
        _ => format!("{}-{unique}", sanitize_stem(original)),
    }
}

/// Directory (relative to the upload root) holding a project's files.
pub fn project_dir_name(project_id: i64) -> String {
    format!("project_{project_id}")
}

/// Guess the hosting service of an external link.
pub fn detect_link_type(url: &str) -> &'static str {
    let lower = url.to_ascii_lowercase();
    if lower.contains("drive.google.com") || lower.contains("docs.google.com") {
        LINK_TYPE_GOOGLE_DRIVE
    } else if lower.contains("dropbox.com") {
        LINK_TYPE_DROPBOX
    } else if lower.contains("youtube.com") || lower.contains("youtu.be") {
        LINK_TYPE_YOUTUBE
    } else if lower.contains("vimeo.com") {
        LINK_TYPE_VIMEO
    } else if lower.contains("onedrive.live.com") || lower.contains("1drv.ms") {
        LINK_TYPE_ONEDRIVE
    } else {
        LINK_TYPE_OTHER
    }
}

pub fn validate_external_url(url: &str) -> Result<(), CoreError> {
    let trimmed = url.trim();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(CoreError::Validation(
            "External URL must start with http:// or https://".to_string(),
        ));
    }
    if trimmed.len() > MAX_EXTERNAL_URL_LEN {
        return Err(CoreError::Validation(format!(
            "External URL must not exceed {MAX_EXTERNAL_URL_LEN} characters"
        )));
    }
    Ok(())
}

/// An asset needs a stored file or an external link.
pub fn validate_asset_source(file_path: Option<&str>, external_url: Option<&str>) -> Result<(), CoreError> {
    let has_file = file_path.is_some_and(|p| !p.is_empty());
    let has_link = external_url.is_some_and(|u| !u.is_empty());
    if has_file || has_link {
        Ok(())
    } else {
        Err(CoreError::Validation(
            "Asset requires either a file or an external link".to_string(),
        ))
    }
}

/// JSON key of the broadcaster file-view group for a category.
pub fn category_group_key(category: &str) -> &'static str {
    match category {
        ASSET_CATEGORY_SCRIPT => "scripts",
        ASSET_CATEGORY_CONTRACT => "contracts",
        ASSET_CATEGORY_PREVIEW_VIDEO => "previews",
        ASSET_CATEGORY_MASTER_VIDEO => "masters",
        _ => "others",
    }
}

/// Group items by [`category_group_key`]. Every group key is present, even when empty.
pub fn group_by_category<T, F>(items: Vec<T>, category_of: F) -> BTreeMap<&'static str, Vec<T>>
where
    F: Fn(&T) -> &str,
{
    let mut groups: BTreeMap<&'static str, Vec<T>> = ["scripts", "contracts", "previews", "masters", "others"]
        .into_iter()
        .map(|k| (k, Vec::new()))
        .collect();
    for item in items {
        let key = category_group_key(category_of(&item));
        groups.entry(key).or_default().push(item);
    }
    groups
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn extension_checked_against_category() {
        assert!(validate_upload_extension("draft.PDF", Some(ASSET_CATEGORY_SCRIPT)).is_ok());
        assert_matches!(
            validate_upload_extension("clip.mp4", Some(ASSET_CATEGORY_SCRIPT)),
            Err(CoreError::Validation(msg)) if msg.contains(".mp4") && msg.contains("Script")
        );
        assert!(validate_upload_extension("final.mxf", Some(ASSET_CATEGORY_MASTER_VIDEO)).is_ok());
        assert!(validate_upload_extension("final.mxf", Some(ASSET_CATEGORY_PREVIEW_VIDEO)).is_err());
    }

    #[test]
    fn unknown_category_falls_back_to_common_types() {
        assert!(validate_upload_extension("photo.gif", None).is_ok());
        assert!(validate_upload_extension("photo.gif", Some("Poster")).is_ok());
        assert!(validate_upload_extension("tool.exe", None).is_err());
        assert!(validate_upload_extension("README", None).is_err());
    }

    #[test]
    fn file_extension_ignores_dotfiles() {
        assert_eq!(file_extension("a.tar.GZ"), Some("gz".to_string()));
        assert_eq!(file_extension(".env"), None);
        assert_eq!(file_extension("noext"), None);
    }

    #[test]
    fn stored_names_are_sanitized() {
        assert_eq!(
            stored_file_name("My Script (v2).PDF", "1700000000-42"),
            "my_script__v2_-1700000000-42.pdf"
        );
        assert_eq!(stored_file_name("noext", "x"), "noext-x");
    }

    #[test]
    fn link_types_are_detected() {
        assert_eq!(detect_link_type("https://drive.google.com/file/d/abc"), LINK_TYPE_GOOGLE_DRIVE);
        assert_eq!(detect_link_type("https://youtu.be/xyz"), LINK_TYPE_YOUTUBE);
        assert_eq!(detect_link_type("https://www.dropbox.com/s/1"), LINK_TYPE_DROPBOX);
        assert_eq!(detect_link_type("https://vimeo.com/1"), LINK_TYPE_VIMEO);
        assert_eq!(detect_link_type("https://1drv.ms/u/s!x"), LINK_TYPE_ONEDRIVE);
        assert_eq!(detect_link_type("https://example.com/a"), LINK_TYPE_OTHER);
    }

    #[test]
    fn external_url_rules() {
        assert!(validate_external_url("https://example.com").is_ok());
        assert!(validate_external_url("ftp://example.com").is_err());
        let long = format!("https://example.com/{}", "a".repeat(500));
        assert!(validate_external_url(&long).is_err());
    }

    #[test]
    fn asset_needs_a_source() {
        assert!(validate_asset_source(Some("uploads/a.pdf"), None).is_ok());
        assert!(validate_asset_source(None, Some("https://x")).is_ok());
        assert!(validate_asset_source(Some(""), None).is_err());
        assert!(validate_asset_source(None, None).is_err());
    }

    #[test]
    fn grouping_keeps_every_bucket() {
        let items = vec![ASSET_CATEGORY_SCRIPT, ASSET_CATEGORY_OTHER, ASSET_CATEGORY_SCRIPT];
        let groups = group_by_category(items, |c| *c);
        assert_eq!(groups["scripts"].len(), 2);
        assert_eq!(groups["others"].len(), 1);
        assert!(groups["masters"].is_empty());
        assert_eq!(groups.len(), 5);
    }
}
