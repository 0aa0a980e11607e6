//! The closed catalog of supported content kinds and their conversion targets.

use std::fmt;

use crate::media_type::MediaType;

/// Every content kind a fragment may be stored as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContentKind {
    TextPlain,
    TextMarkdown,
    TextHtml,
    TextCsv,
    ApplicationJson,
    ApplicationYaml,
    ImagePng,
    ImageJpeg,
    ImageWebp,
    ImageGif,
    ImageAvif,
}

use ContentKind::*;

const PLAIN_TARGETS: &[ContentKind] = &[TextPlain];
const MARKDOWN_TARGETS: &[ContentKind] = &[TextMarkdown, TextHtml, TextPlain];
const HTML_TARGETS: &[ContentKind] = &[TextHtml, TextPlain];
const CSV_TARGETS: &[ContentKind] = &[TextCsv, ApplicationJson, TextPlain];
const JSON_TARGETS: &[ContentKind] = &[ApplicationJson, TextPlain, ApplicationYaml];
const YAML_TARGETS: &[ContentKind] = &[ApplicationYaml, TextPlain, ApplicationJson];
const PNG_TARGETS: &[ContentKind] = &[ImagePng, ImageJpeg, ImageWebp, ImageGif, ImageAvif];
const JPEG_TARGETS: &[ContentKind] = &[ImageJpeg, ImagePng, ImageWebp, ImageGif, ImageAvif];
const WEBP_TARGETS: &[ContentKind] = &[ImageWebp, ImagePng, ImageJpeg, ImageGif, ImageAvif];
const GIF_TARGETS: &[ContentKind] = &[ImageGif, ImagePng, ImageJpeg, ImageWebp, ImageAvif];
const AVIF_TARGETS: &[ContentKind] = &[ImageAvif, ImagePng, ImageJpeg, ImageWebp, ImageGif];

impl ContentKind {
    pub const ALL: [ContentKind; 11] = [
        TextPlain,
        TextMarkdown,
        TextHtml,
        TextCsv,
        ApplicationJson,
        ApplicationYaml,
        ImagePng,
        ImageJpeg,
        ImageWebp,
        ImageGif,
        ImageAvif,
    ];

    /// Resolve a base MIME type (no parameters), case-insensitively.
    pub fn from_essence(essence: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.mime().eq_ignore_ascii_case(essence.trim()))
    }

    pub fn from_media_type(media_type: &MediaType) -> Option<Self> {
        Self::from_essence(media_type.essence())
    }

    pub fn mime(self) -> &'static str {
        match self {
            TextPlain => "text/plain",
            TextMarkdown => "text/markdown",
            TextHtml => "text/html",
            TextCsv => "text/csv",
            ApplicationJson => "application/json",
            ApplicationYaml => "application/yaml",
            ImagePng => "image/png",
            ImageJpeg => "image/jpeg",
            ImageWebp => "image/webp",
            ImageGif => "image/gif",
            ImageAvif => "image/avif",
        }
    }

    /// Conversion targets, always starting with `self`.
    pub fn conversions(self) -> &'static [ContentKind] {
        match self {
            TextPlain => PLAIN_TARGETS,
            TextMarkdown => MARKDOWN_TARGETS,
            TextHtml => HTML_TARGETS,
            TextCsv => CSV_TARGETS,
            ApplicationJson => JSON_TARGETS,
            ApplicationYaml => YAML_TARGETS,
            ImagePng => PNG_TARGETS,
            ImageJpeg => JPEG_TARGETS,
            ImageWebp => WEBP_TARGETS,
            ImageGif => GIF_TARGETS,
            ImageAvif => AVIF_TARGETS,
        }
    }

    pub fn can_convert_to(self, target: ContentKind) -> bool {
        self.conversions().contains(&target)
    }

    pub fn is_text(self) -> bool {
        !self.is_image()
    }

    pub fn is_image(self) -> bool {
        matches!(self, ImagePng | ImageJpeg | ImageWebp | ImageGif | ImageAvif)
    }

    /// Canonical file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            TextPlain => "txt",
            TextMarkdown => "md",
            TextHtml => "html",
            TextCsv => "csv",
            ApplicationJson => "json",
            ApplicationYaml => "yaml",
            ImagePng => "png",
            ImageJpeg => "jpg",
            ImageWebp => "webp",
            ImageGif => "gif",
            ImageAvif => "avif",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "jpeg" => Some(ImageJpeg),
            "yml" => Some(ApplicationYaml),
            "markdown" => Some(TextMarkdown),
            "htm" => Some(TextHtml),
            other => Self::ALL.into_iter().find(|kind| kind.extension() == other),
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// True if the base MIME type of `value` is in the catalog.
pub fn is_supported(value: &str) -> bool {
    MediaType::parse(value)
        .ok()
        .and_then(|mt| ContentKind::from_media_type(&mt))
        .is_some()
}

/// MIME types that `value` may be converted into, or empty if unsupported.
pub fn conversions_for(value: &str) -> Vec<&'static str> {
    MediaType::parse(value)
        .ok()
        .and_then(|mt| ContentKind::from_media_type(&mt))
        .map(|kind| kind.conversions().iter().map(|k| k.mime()).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_types_ignore_parameters_and_case() {
        assert!(is_supported("text/plain"));
        assert!(is_supported("text/plain; charset=utf-8"));
        assert!(is_supported("Text/Markdown"));
        assert!(is_supported("image/avif"));
        assert!(!is_supported("application/octet-stream"));
        assert!(!is_supported("image/bmp"));
        assert!(!is_supported("not a type"));
    }

    #[test]
    fn test_every_kind_converts_to_itself_first() {
        for kind in ContentKind::ALL {
            assert_eq!(kind.conversions()[0], kind, "{kind} must list itself first");
        }
    }

    #[test]
    fn test_text_conversions() {
        assert_eq!(conversions_for("text/plain"), vec!["text/plain"]);
        assert_eq!(
            conversions_for("text/markdown"),
            vec!["text/markdown", "text/html", "text/plain"]
        );
        assert_eq!(conversions_for("text/html"), vec!["text/html", "text/plain"]);
        assert_eq!(
            conversions_for("text/csv"),
            vec!["text/csv", "application/json", "text/plain"]
        );
        assert_eq!(
            conversions_for("application/json; charset=utf-8"),
            vec!["application/json", "text/plain", "application/yaml"]
        );
        assert_eq!(
            conversions_for("application/yaml"),
            vec!["application/yaml", "text/plain", "application/json"]
        );
        assert!(conversions_for("video/mp4").is_empty());
    }

    #[test]
    fn test_images_convert_to_every_image() {
        let images: Vec<_> = ContentKind::ALL.into_iter().filter(|k| k.is_image()).collect();
        assert_eq!(images.len(), 5);
        for from in &images {
            for to in &images {
                assert!(from.can_convert_to(*to), "{from} -> {to}");
            }
            assert!(!from.can_convert_to(TextPlain));
        }
    }

    #[test]
    fn test_extension_round_trip() {
        for kind in ContentKind::ALL {
            assert_eq!(ContentKind::from_extension(kind.extension()), Some(kind));
        }
        assert_eq!(ContentKind::from_extension("JPEG"), Some(ImageJpeg));
        assert_eq!(ContentKind::from_extension(".yml"), Some(ApplicationYaml));
        assert_eq!(ContentKind::from_extension("exe"), None);
    }

    #[test]
    fn test_text_and_image_partition() {
        assert!(ApplicationJson.is_text());
        assert!(TextCsv.is_text());
        assert!(!ImageGif.is_text());
    }
}
