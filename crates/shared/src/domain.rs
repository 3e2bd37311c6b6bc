/// File extensions the upload workflow accepts, matched case-insensitively
/// against the end of the filename.
pub const SUPPORTED_EXTENSIONS: [&str; 2] = [".pdf", ".docx"];

/// A user-selected resume held in memory for the current session. At most one
/// exists per workflow; nothing is ever written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CvFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl CvFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn has_supported_extension(&self) -> bool {
        is_supported_cv_filename(&self.name)
    }
}

pub fn is_supported_cv_filename(name: &str) -> bool {
    let name = name.to_lowercase();
    SUPPORTED_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Human-readable size with one decimal above the byte range, e.g. "2.4 KB".
pub fn format_file_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = 1024.0 * 1024.0;

    if bytes < 1024 {
        return format!("{bytes} B");
    }
    if (bytes as f64) < MIB {
        return format!("{:.1} KB", bytes as f64 / KIB);
    }
    format!("{:.1} MB", bytes as f64 / MIB)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_pdf_and_docx_regardless_of_case() {
        assert!(is_supported_cv_filename("resume.pdf"));
        assert!(is_supported_cv_filename("Resume.DOCX"));
        assert!(is_supported_cv_filename("archive.v2.PDF"));
    }

    #[test]
    fn rejects_other_extensions() {
        assert!(!is_supported_cv_filename("resume.txt"));
        assert!(!is_supported_cv_filename("resume.pdf.exe"));
        assert!(!is_supported_cv_filename("resume.doc"));
        assert!(!is_supported_cv_filename("pdf"));
        assert!(!is_supported_cv_filename(""));
    }

    #[test]
    fn formats_sizes_across_unit_boundaries() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(1023), "1023 B");
        assert_eq!(format_file_size(1024), "1.0 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5.0 MB");
    }
}
