//! Printable practice worksheets.

use serde::Serialize;

/// Rows that fit on one printed page.
pub const LINES_PER_PAGE: usize = 12;

/// Guide lines drawn under each sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Ruling {
    Single,
    Double,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PracticeLine {
    pub sample: String,
    pub ruling: Ruling,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Worksheet {
    pub heading: String,
    pub lines: Vec<PracticeLine>,
}

const ENGLISH_PAIRS: [&str; 26] = [
    "A a", "B b", "C c", "D d", "E e", "F f", "G g", "H h", "I i", "J j", "K k", "L l", "M m",
    "N n", "O o", "P p", "Q q", "R r", "S s", "T t", "U u", "V v", "W w", "X x", "Y y", "Z z",
];

const CURSIVE_ROWS: [&str; 9] = [
    "aa bb cc", "dd ee ff", "gg hh ii", "jj kk ll", "mm nn oo", "pp qq rr", "ss tt uu",
    "vv ww xx", "yy zz",
];

const MATRAS: [&str; 11] = ["का", "कि", "की", "कु", "कू", "के", "कै", "को", "कौ", "कं", "क:"];

const SHIROREKHA_CONSONANTS: [&str; 12] =
    ["क", "ख", "ग", "घ", "त", "न", "म", "फ", "थ", "ध", "भ", "श"];

impl Worksheet {
    fn from_samples<'a>(
        heading: &str,
        samples: impl IntoIterator<Item = &'a str>,
        ruling: Ruling,
    ) -> Self {
        Self {
            heading: heading.to_string(),
            lines: samples
                .into_iter()
                .take(LINES_PER_PAGE)
                .map(|sample| PracticeLine {
                    sample: sample.to_string(),
                    ruling,
                })
                .collect(),
        }
    }

    /// One practice line per input line, trimmed. Blank lines stay as empty rows.
    pub fn from_text(heading: &str, text: &str, ruling: Ruling) -> Self {
        Self {
            heading: heading.trim().to_string(),
            lines: text
                .lines()
                .map(|line| PracticeLine {
                    sample: line.trim().to_string(),
                    ruling,
                })
                .collect(),
        }
    }

    pub fn english_az() -> Self {
        Self::from_samples("English A–Z Practice Sheet", ENGLISH_PAIRS, Ruling::Double)
    }

    pub fn cursive() -> Self {
        Self::from_samples("Cursive Practice Sheet", CURSIVE_ROWS, Ruling::Double)
    }

    pub fn devanagari_matra() -> Self {
        Self::from_samples(
            "Devanagari Matra Practice",
            MATRAS.iter().chain(MATRAS.iter()).copied(),
            Ruling::Double,
        )
    }

    pub fn shirorekha() -> Self {
        Self::from_samples("Shirorekha Practice Sheet", SHIROREKHA_CONSONANTS, Ruling::Double)
    }

    /// A full page tracing the same text on every row.
    pub fn full_practice(text: &str) -> Self {
        let text = text.trim();
        Self::from_samples(
            "Full Page Practice",
            std::iter::repeat_n(text, LINES_PER_PAGE),
            Ruling::Double,
        )
    }
}
