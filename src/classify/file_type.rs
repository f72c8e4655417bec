/// Label used when a URI stem has no extension
pub const NO_FILE_TYPE: &str = "None";

/// Extracts the file extension at the end of a URI stem
///
/// The extension is the run of word characters after the final `.`, and it
/// must reach the end of the stem. Anything else yields [`NO_FILE_TYPE`].
///
/// # Examples
///
/// ```
/// use weblog_star::classify::file_type;
///
/// assert_eq!(file_type("/images/logo.png"), "png");
/// assert_eq!(file_type("/about/"), "None");
/// ```
pub fn file_type(uri_stem: &str) -> String {
    match uri_stem.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.chars().all(is_word_char) => ext.to_string(),
        _ => NO_FILE_TYPE.to_string(),
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_extensions() {
        assert_eq!(file_type("/index.html"), "html");
        assert_eq!(file_type("/robots.txt"), "txt");
        assert_eq!(file_type("/scripts/app_v2.min.js"), "js");
    }

    #[test]
    fn test_last_extension_wins() {
        assert_eq!(file_type("/downloads/archive.tar.gz"), "gz");
    }

    #[test]
    fn test_no_extension() {
        assert_eq!(file_type("/"), NO_FILE_TYPE);
        assert_eq!(file_type("/about"), NO_FILE_TYPE);
        assert_eq!(file_type(""), NO_FILE_TYPE);
    }

    #[test]
    fn test_trailing_dot() {
        assert_eq!(file_type("/file."), NO_FILE_TYPE);
    }

    #[test]
    fn test_dot_in_directory_only() {
        assert_eq!(file_type("/v1.2/users"), NO_FILE_TYPE);
        assert_eq!(file_type("/dir.v1/page.aspx"), "aspx");
    }

    #[test]
    fn test_non_word_suffix() {
        assert_eq!(file_type("/page.php-old"), NO_FILE_TYPE);
        assert_eq!(file_type("/image.JPG"), "JPG");
    }
}
