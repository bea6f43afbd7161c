//! Title normalization: NFC, lowercase, and Vietnamese word segmentation.
//!
//! Vietnamese writes every syllable as a separate space-delimited unit, so a
//! bag-of-words model over raw whitespace tokens sees "học" and "sinh"
//! instead of the word "học sinh". The normalizer merges runs of syllables
//! that form a known compound into one token joined with `_`:
//!
//! ```text
//! "Ca sĩ lộ clip với học sinh" -> "ca_sĩ lộ clip với học_sinh"
//! ```
//!
//! The normalizer is serialized into every trained model so training and
//! inference always segment identically.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

/// Word runs or single punctuation marks. `_` is a word character, so an
/// already segmented token survives a second pass unchanged.
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+|[^\w\s]").unwrap());

/// Compounds common in the news titles of the training corpus.
const BUILTIN_LEXICON: &[&str] = &[
    // education
    "giáo dục", "học sinh", "sinh viên", "nữ sinh", "nam sinh", "thầy giáo", "cô giáo",
    "giáo viên", "giảng viên", "học đường", "điểm thi", "gian lận", "trường học",
    "nhà trường", "phụ huynh", "kỷ luật", "đình chỉ", "bằng cấp", "học phí", "đề thi",
    "ký túc xá", "đại học", "trường đại học", "tuyển sinh", "bạo lực học đường",
    // technology
    "công nghệ", "trí tuệ nhân tạo", "phần mềm", "tiền số", "tiền ảo", "dữ liệu",
    "tấn công", "thuật toán", "nền tảng", "thiết bị", "ứng dụng", "điện thoại",
    "mạng xã hội", "hệ sinh thái", "an ninh mạng", "tin tặc",
    // entertainment
    "giải trí", "nghệ sĩ", "ca sĩ", "diễn viên", "hoa hậu", "người mẫu", "tình ái",
    "ngoại tình", "đấu tố", "sao kê", "từ thiện", "âm nhạc", "hợp đồng âm nhạc",
    "hậu trường", "chia tay", "nổi tiếng", "người nổi tiếng", "nhạy cảm", "giao lưu",
    "bài hát", "phim ảnh", "khán giả",
    // business
    "kinh doanh", "trái phiếu", "cổ phiếu", "chứng khoán", "lừa đảo", "tài sản",
    "giám đốc", "tổng giám đốc", "hợp đồng", "bất động sản", "chiếm đoạt", "phá sản",
    "nợ nần", "đa cấp", "đầu tư", "lợi nhuận", "vỡ nợ", "tài chính", "doanh nghiệp",
    "công ty", "ngân hàng", "thị trường",
    // general news vocabulary
    "vấn đề", "liên quan", "danh sách", "thông tin", "tạm giữ", "tạm giam", "hình sự",
    "hành vi", "chất cấm", "xúc phạm", "đối tượng", "tranh cãi", "trung tâm",
    "lên tiếng", "sử dụng", "nhà riêng", "cảnh sát", "công an", "điều tra", "khởi tố",
    "bắt giữ", "xử phạt", "dư luận",
];

/// Lowercasing, tokenizing, lexicon-driven word segmenter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextNormalizer {
    /// Compounds as lowercase NFC syllables separated by single spaces.
    lexicon: HashSet<String>,
    /// Longest compound length in syllables.
    max_syllables: usize,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::vietnamese()
    }
}

impl TextNormalizer {
    /// Normalizer with the built-in Vietnamese news lexicon.
    pub fn vietnamese() -> Self {
        Self::with_phrases(BUILTIN_LEXICON.iter().copied())
    }

    /// Normalizer over an explicit phrase list. Phrases are folded the same
    /// way input text is, so their spelling and case do not matter.
    pub fn with_phrases<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalizer = Self {
            lexicon: HashSet::new(),
            max_syllables: 1,
        };
        normalizer.extend(phrases);
        normalizer
    }

    /// Add phrases to the lexicon. Single-syllable entries and entries that
    /// already contain `_` are ignored.
    pub fn extend<I, S>(&mut self, phrases: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for phrase in phrases {
            let syllables = syllables(phrase.as_ref());
            if syllables.len() < 2 || syllables.iter().any(|s| s.contains('_')) {
                continue;
            }
            self.max_syllables = self.max_syllables.max(syllables.len());
            self.lexicon.insert(syllables.join(" "));
        }
    }

    /// Read extra phrases from a file, one per line; `#` starts a comment.
    pub fn extend_from_file(&mut self, path: &Path) -> std::io::Result<usize> {
        let content = std::fs::read_to_string(path)?;
        let before = self.lexicon.len();
        self.extend(
            content
                .lines()
                .map(|line| line.split('#').next().unwrap_or("").trim())
                .filter(|line| !line.is_empty()),
        );
        Ok(self.lexicon.len() - before)
    }

    pub fn lexicon_len(&self) -> usize {
        self.lexicon.len()
    }

    /// Lowercase and segment a title. Idempotent.
    pub fn normalize(&self, title: &str) -> String {
        let tokens = syllables(title);
        let mut out: Vec<String> = Vec::with_capacity(tokens.len());
        let mut i = 0;
        while i < tokens.len() {
            let longest = (2..=self.max_syllables.min(tokens.len() - i))
                .rev()
                .find(|&n| self.lexicon.contains(&tokens[i..i + n].join(" ")));
            match longest {
                Some(n) => {
                    out.push(tokens[i..i + n].join("_"));
                    i += n;
                }
                None => {
                    out.push(tokens[i].clone());
                    i += 1;
                }
            }
        }
        out.join(" ")
    }
}

/// NFC-fold, lowercase and split into word runs and punctuation marks.
fn syllables(text: &str) -> Vec<String> {
    let lowered = text.nfc().collect::<String>().to_lowercase();
    let folded: String = lowered.nfc().collect();
    TOKEN_RE
        .find_iter(&folded)
        .map(|m| m.as_str().to_string())
        .collect()
}

static DEFAULT_NORMALIZER: Lazy<TextNormalizer> = Lazy::new(TextNormalizer::vietnamese);

/// Normalize with the built-in lexicon.
pub fn normalize(title: &str) -> String {
    DEFAULT_NORMALIZER.normalize(title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_known_compounds() {
        assert_eq!(
            normalize("Ca sĩ lộ clip với học sinh"),
            "ca_sĩ lộ clip với học_sinh"
        );
    }

    #[test]
    fn test_longest_match_wins() {
        assert_eq!(
            normalize("Tranh cãi hợp đồng âm nhạc"),
            "tranh_cãi hợp_đồng_âm_nhạc"
        );
        assert_eq!(normalize("Hợp đồng mới"), "hợp_đồng mới");
    }

    #[test]
    fn test_punctuation_is_split_off() {
        assert_eq!(
            normalize("Học sinh, sinh viên, giáo viên"),
            "học_sinh , sinh_viên , giáo_viên"
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "Ca sĩ Pháo và ViruSs livestream đấu tố nhau về hợp đồng âm nhạc",
            "Shark Bình lên tiếng về việc sử dụng AI trong hệ sinh thái công nghệ",
            "Bắt tạm giam nhóm đối tượng lừa đảo chiếm đoạt tài sản qua mạng",
            "  Tranh cãi: giáo viên trung tâm Apax bị phụ huynh quây kín đòi tiền!  ",
            "anti-fan_club ĐÀ NẴNG",
            "",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_decomposed_input_matches_composed() {
        let composed = "học sinh";
        let decomposed: String = composed.nfd().collect();
        assert_ne!(composed, decomposed);
        assert_eq!(normalize(&decomposed), "học_sinh");
    }

    #[test]
    fn test_custom_phrases_are_folded() {
        let normalizer = TextNormalizer::with_phrases(["Shark Tank", "x"]);
        assert_eq!(normalizer.lexicon_len(), 1);
        assert_eq!(normalizer.normalize("SHARK TANK Việt"), "shark_tank việt");
    }

    #[test]
    fn test_extend_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            "# extra phrases\nshark tank\n\nhot girl # comment\n".as_bytes(),
        )
        .unwrap();
        let mut normalizer = TextNormalizer::with_phrases(Vec::<String>::new());
        let added = normalizer.extend_from_file(file.path()).unwrap();
        assert_eq!(added, 2);
        assert_eq!(normalizer.normalize("Hot girl Shark Tank"), "hot_girl shark_tank");
    }
}
