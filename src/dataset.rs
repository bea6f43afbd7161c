//! Loading scraped datasets, canonicalizing annotator tags and building
//! training samples.

use crate::error::DatasetError;
use crate::models::{Dataset, TrainingSample};
use itertools::Itertools;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, instrument, warn};
use unicode_normalization::UnicodeNormalization;

/// Canonical topic labels of the corpus.
pub const KNOWN_LABELS: [&str; 4] = ["công nghệ", "giáo dục", "giải trí", "kinh doanh"];

/// Unaccented spellings annotators used for the canonical labels.
const LABEL_ALIASES: [(&str, &str); 4] = [
    ("giao duc", "giáo dục"),
    ("giai tri", "giải trí"),
    ("cong nghe", "công nghệ"),
    ("kinh doanh", "kinh doanh"),
];

#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn load_dataset(path: &Path) -> Result<Dataset, DatasetError> {
    let raw = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let dataset: Dataset = serde_json::from_str(&raw).map_err(|source| DatasetError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    info!(entries = dataset.len(), "Loaded dataset");
    Ok(dataset)
}

/// Load several dataset files into one; later files win on duplicate URLs.
pub fn load_datasets(paths: &[impl AsRef<Path>]) -> Result<Dataset, DatasetError> {
    let mut merged = Dataset::new();
    for path in paths {
        let before = merged.len();
        let dataset = load_dataset(path.as_ref())?;
        let incoming = dataset.len();
        merged.extend(dataset);
        let overwritten = before + incoming - merged.len();
        if overwritten > 0 {
            warn!(overwritten, path = %path.as_ref().display(), "Duplicate URLs overwritten");
        }
    }
    Ok(merged)
}

/// Fold one tag: NFC, lowercase, collapse whitespace, map unaccented aliases.
pub fn canonical_label(raw: &str) -> String {
    let folded: String = raw.nfc().collect::<String>().to_lowercase();
    let collapsed = folded.split_whitespace().join(" ");
    LABEL_ALIASES
        .iter()
        .find(|(alias, _)| *alias == collapsed)
        .map(|(_, label)| label.to_string())
        .unwrap_or(collapsed)
}

/// Split a comma separated tag string into sorted, unique canonical labels.
///
/// A fragment that is not a known label but contains known labels
/// (`"công nghệ giáo dục"`) yields those labels; anything else is kept as
/// written and reported.
pub fn split_tags(raw: &str) -> Vec<String> {
    let mut labels = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let label = canonical_label(part);
        if KNOWN_LABELS.contains(&label.as_str()) {
            labels.push(label);
            continue;
        }
        let found: Vec<&str> = KNOWN_LABELS
            .iter()
            .copied()
            .filter(|known| label.contains(known))
            .collect();
        if found.is_empty() {
            warn!(fragment = %part, tag = %raw, "Unrecognized tag kept as written");
            labels.push(label);
        } else {
            labels.extend(found.into_iter().map(str::to_string));
        }
    }
    labels.into_iter().sorted().dedup().collect()
}

/// Training samples from a dataset. With `include_content` the scraped body
/// excerpt is appended to the title.
pub fn samples_from_dataset(dataset: &Dataset, include_content: bool) -> Vec<TrainingSample> {
    let samples: Vec<TrainingSample> = dataset
        .values()
        .filter_map(|entry| {
            let labels = split_tags(&entry.tag);
            if labels.is_empty() || entry.title.trim().is_empty() {
                return None;
            }
            let text = match (&entry.content, include_content) {
                (Some(content), true) => format!("{} {}", entry.title, content),
                _ => entry.title.clone(),
            };
            Some(TrainingSample { text, labels })
        })
        .collect();
    debug!(
        entries = dataset.len(),
        samples = samples.len(),
        "Built training samples"
    );
    samples
}

/// Occurrences of every canonical label across a dataset.
pub fn tag_counts(dataset: &Dataset) -> BTreeMap<String, usize> {
    dataset
        .values()
        .flat_map(|entry| split_tags(&entry.tag))
        .counts()
        .into_iter()
        .collect()
}

/// Keyword phrases per label used to seed the model.
const KEYWORDS: [(&str, &[&str]); 4] = [
    (
        "giáo dục",
        &[
            "nữ sinh", "nam sinh", "thầy giáo", "cô giáo", "giảng viên", "học đường",
            "học sinh", "điểm thi", "gian lận", "trường học", "phụ huynh", "kỷ luật",
            "đình chỉ", "bằng cấp", "học phí", "đề thi", "nhà trường",
        ],
    ),
    (
        "công nghệ",
        &[
            "AI", "trí tuệ nhân tạo", "chatgpt", "phần mềm", "tiền số", "crypto", "hacker",
            "dữ liệu", "tấn công mạng", "deepfake", "thuật toán", "nền tảng", "robot",
            "thiết bị",
        ],
    ),
    (
        "giải trí",
        &[
            "nghệ sĩ", "ca sĩ", "hoa hậu", "showbiz", "livestream", "drama", "tình ái",
            "ngoại tình", "đấu tố", "sao kê", "từ thiện", "fan", "anti-fan",
            "hợp đồng âm nhạc", "showbiz", "hậu trường", "lên giường", "chia tay", "tiktok",
        ],
    ),
    (
        "kinh doanh",
        &[
            "trái phiếu", "cổ phiếu", "lừa đảo", "tài sản", "giám đốc", "hợp đồng",
            "bất động sản", "chiếm đoạt", "phá sản", "nợ nần", "đa cấp", "đầu tư",
            "lợi nhuận", "vỡ nợ", "tài chính",
        ],
    ),
];

/// Hand-written titles covering mixed-topic cases.
const EXTENDED_SAMPLES: [(&str, &[&str]); 12] = [
    ("Bị tạm giữ hình sự vì hành vi lừa đảo", &["kinh doanh"]),
    ("Nghệ sĩ bị tạm giữ hình sự vì dùng chất cấm", &["giải trí"]),
    ("Giáo viên bị tạm giữ hình sự vì xúc phạm học sinh", &["giáo dục"]),
    ("Học sinh, sinh viên, giáo viên, trường học, nữ sinh", &["giáo dục"]),
    ("Nữ sinh lộ clip với thầy giáo trong ký túc xá", &["giáo dục", "giải trí"]),
    ("Ca sĩ lộ clip với học sinh tại nhà riêng", &["giải trí", "giáo dục"]),
    ("Danh sách ca sĩ, diễn viên, nghệ sĩ nổi tiếng", &["giải trí"]),
    ("Thông tin về học sinh, sinh viên, giáo viên", &["giáo dục"]),
    ("Nghệ sĩ làm từ thiện tại trường học cho học sinh", &["giải trí", "giáo dục"]),
    ("Ca sĩ hát giao lưu cùng học sinh sinh viên", &["giải trí", "giáo dục"]),
    ("Drama lộ clip nhạy cảm của người nổi tiếng", &["giải trí"]),
    ("Vấn đề nhạy cảm liên quan đến học đường", &["giáo dục"]),
];

/// The sample keyword set appended to scraped data before training:
/// one "Vấn đề về <keyword>" title per keyword plus the extended titles.
pub fn keyword_samples() -> Vec<TrainingSample> {
    let keyword_titles = KEYWORDS.iter().flat_map(|(label, words)| {
        words
            .iter()
            .map(move |word| TrainingSample::new(format!("Vấn đề về {word}"), &[*label]))
    });
    let extended = EXTENDED_SAMPLES
        .iter()
        .map(|(title, labels)| TrainingSample::new(*title, *labels));
    keyword_titles.chain(extended).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DatasetEntry;

    fn entry(title: &str, tag: &str) -> DatasetEntry {
        DatasetEntry {
            title: title.to_string(),
            tag: tag.to_string(),
            content: None,
        }
    }

    #[test]
    fn test_canonical_label() {
        assert_eq!(canonical_label("  Giải   Trí "), "giải trí");
        assert_eq!(canonical_label("giai tri"), "giải trí");
        assert_eq!(canonical_label("KINH   DOANH"), "kinh doanh");
        assert_eq!(canonical_label("Thể thao"), "thể thao");
    }

    #[test]
    fn test_split_tags() {
        assert_eq!(split_tags("Giáo dục, giải trí"), vec!["giáo dục", "giải trí"]);
        assert_eq!(split_tags("giải trí, Giải trí,"), vec!["giải trí"]);
        assert_eq!(
            split_tags("Công nghệ Giáo dục"),
            vec!["công nghệ", "giáo dục"]
        );
        assert_eq!(split_tags("thể thao"), vec!["thể thao"]);
        assert!(split_tags("  ").is_empty());
    }

    #[test]
    fn test_samples_skip_untagged_entries() {
        let mut dataset = Dataset::new();
        dataset.insert("https://a.vn/1".into(), entry("Ca sĩ đấu tố", "giải trí"));
        dataset.insert("https://a.vn/2".into(), entry("Không có tag", ""));
        let mut with_content = entry("Học phí tăng", "giáo dục");
        with_content.content = Some("trường đại học công bố".into());
        dataset.insert("https://a.vn/3".into(), with_content);

        let samples = samples_from_dataset(&dataset, false);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].text, "Học phí tăng");

        let samples = samples_from_dataset(&dataset, true);
        assert_eq!(samples[1].text, "Học phí tăng trường đại học công bố");
    }

    #[test]
    fn test_tag_counts() {
        let mut dataset = Dataset::new();
        dataset.insert("1".into(), entry("a", "giải trí, giáo dục"));
        dataset.insert("2".into(), entry("b", "Giải trí"));
        let counts = tag_counts(&dataset);
        assert_eq!(counts["giải trí"], 2);
        assert_eq!(counts["giáo dục"], 1);
    }

    #[test]
    fn test_keyword_samples() {
        let samples = keyword_samples();
        assert_eq!(samples.len(), 17 + 14 + 19 + 15 + 12);
        assert_eq!(samples[0].text, "Vấn đề về nữ sinh");
        assert!(
            samples
                .iter()
                .flat_map(|s| s.labels.iter())
                .all(|l| KNOWN_LABELS.contains(&l.as_str()))
        );
    }

    #[test]
    fn test_load_datasets_merges_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.json");
        let b = dir.path().join("b.json");
        std::fs::write(&a, r#"{"u1": {"title": "A", "tag": "giải trí"}}"#).unwrap();
        std::fs::write(
            &b,
            r#"{"u1": {"title": "A2", "tag": "giải trí"}, "u2": {"title": "B", "tag": "kinh doanh"}}"#,
        )
        .unwrap();
        let merged = load_datasets(&[a, b]).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged["u1"].title, "A2");

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "[1, 2]").unwrap();
        assert!(matches!(
            load_dataset(&bad),
            Err(DatasetError::Json { .. })
        ));
    }
}
