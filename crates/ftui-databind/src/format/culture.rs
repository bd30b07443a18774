#![forbid(unsafe_code)]

//! Culture number conventions and the active-culture context.
//!
//! [`FormatInfo`] carries the separators, symbols and sign patterns that the
//! numeric formatter needs. A small built-in table covers the cultures the
//! binding engine ships with; unknown tags fall back by language, then to
//! the invariant culture.
//!
//! [`CultureContext`] owns the active culture with scoped overrides, so a
//! subtree can format under a different culture without touching the base
//! setting. The base culture is versioned and observable.

use std::cell::RefCell;
use std::env;
use std::rc::Rc;

use crate::observable::{Observable, Subscription};

thread_local! {
    static GLOBAL_CULTURE: CultureContext = CultureContext::system();
}

/// Number formatting conventions of one culture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatInfo {
    name: String,
    pub decimal_separator: String,
    pub group_separator: String,
    pub group_size: usize,
    pub negative_sign: String,
    pub percent_symbol: String,
    pub currency_symbol: String,
    pub currency_decimal_digits: usize,
    pub number_decimal_digits: usize,
    pub percent_decimal_digits: usize,
    /// Index into the `$n`, `n$`, `$ n`, `n $` positive currency patterns.
    pub currency_positive_pattern: u8,
    /// Index into the standard negative currency patterns (`($n)`, `-$n`, ...).
    pub currency_negative_pattern: u8,
    /// Index into `n %`, `n%`, `%n`, `% n`.
    pub percent_positive_pattern: u8,
    /// Index into the standard negative percent patterns (`-n %`, `-n%`, ...).
    pub percent_negative_pattern: u8,
}

struct CultureData {
    tag: &'static str,
    decimal: &'static str,
    group: &'static str,
    currency: &'static str,
    currency_digits: usize,
    currency_positive: u8,
    currency_negative: u8,
    percent_positive: u8,
    percent_negative: u8,
}

const NARROW_NBSP: &str = "\u{202f}";

const CULTURES: &[CultureData] = &[
    CultureData {
        tag: "en-US",
        decimal: ".",
        group: ",",
        currency: "$",
        currency_digits: 2,
        currency_positive: 0,
        currency_negative: 1,
        percent_positive: 1,
        percent_negative: 1,
    },
    CultureData {
        tag: "en-GB",
        decimal: ".",
        group: ",",
        currency: "£",
        currency_digits: 2,
        currency_positive: 0,
        currency_negative: 1,
        percent_positive: 1,
        percent_negative: 1,
    },
    CultureData {
        tag: "fr-FR",
        decimal: ",",
        group: NARROW_NBSP,
        currency: "€",
        currency_digits: 2,
        currency_positive: 3,
        currency_negative: 8,
        percent_positive: 0,
        percent_negative: 0,
    },
    CultureData {
        tag: "de-DE",
        decimal: ",",
        group: ".",
        currency: "€",
        currency_digits: 2,
        currency_positive: 3,
        currency_negative: 8,
        percent_positive: 0,
        percent_negative: 0,
    },
    CultureData {
        tag: "es-ES",
        decimal: ",",
        group: ".",
        currency: "€",
        currency_digits: 2,
        currency_positive: 3,
        currency_negative: 8,
        percent_positive: 0,
        percent_negative: 0,
    },
    CultureData {
        tag: "ja-JP",
        decimal: ".",
        group: ",",
        currency: "￥",
        currency_digits: 0,
        currency_positive: 0,
        currency_negative: 1,
        percent_positive: 1,
        percent_negative: 1,
    },
];

impl FormatInfo {
    /// Culture-neutral conventions: `.` decimals, `,` groups, `¤` currency.
    #[must_use]
    pub fn invariant() -> Self {
        Self {
            name: String::new(),
            decimal_separator: ".".into(),
            group_separator: ",".into(),
            group_size: 3,
            negative_sign: "-".into(),
            percent_symbol: "%".into(),
            currency_symbol: "¤".into(),
            currency_decimal_digits: 2,
            number_decimal_digits: 2,
            percent_decimal_digits: 2,
            currency_positive_pattern: 0,
            currency_negative_pattern: 0,
            percent_positive_pattern: 0,
            percent_negative_pattern: 0,
        }
    }

    /// Conventions for a culture tag such as `"de-DE"` or `"fr_FR.UTF-8"`.
    /// Unknown regions fall back to the language's built-in culture, unknown
    /// languages to the invariant culture.
    #[must_use]
    pub fn for_culture(tag: &str) -> Self {
        let Some(tag) = normalize_culture_raw(tag) else {
            return Self::invariant();
        };
        let language = tag.split('-').next().unwrap_or(&tag);
        CULTURES
            .iter()
            .find(|c| c.tag.eq_ignore_ascii_case(&tag))
            .or_else(|| {
                CULTURES.iter().find(|c| {
                    c.tag
                        .split('-')
                        .next()
                        .is_some_and(|l| l.eq_ignore_ascii_case(language))
                })
            })
            .map_or_else(Self::invariant, Self::from_data)
    }

    /// Conventions of the thread's active culture.
    #[must_use]
    pub fn current() -> Self {
        CultureContext::global().format_info()
    }

    /// Culture tag; empty for the invariant culture.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_invariant(&self) -> bool {
        self.name.is_empty()
    }

    fn from_data(data: &CultureData) -> Self {
        Self {
            name: data.tag.to_string(),
            decimal_separator: data.decimal.to_string(),
            group_separator: data.group.to_string(),
            currency_symbol: data.currency.to_string(),
            currency_decimal_digits: data.currency_digits,
            currency_positive_pattern: data.currency_positive,
            currency_negative_pattern: data.currency_negative,
            percent_positive_pattern: data.percent_positive,
            percent_negative_pattern: data.percent_negative,
            ..Self::invariant()
        }
    }
}

impl Default for FormatInfo {
    fn default() -> Self {
        Self::invariant()
    }
}

// ---------------------------------------------------------------------------
// CultureContext
// ---------------------------------------------------------------------------

/// Active culture with scoped overrides.
#[derive(Clone, Debug)]
pub struct CultureContext {
    current: Observable<String>,
    overrides: Rc<RefCell<Vec<String>>>,
}

impl CultureContext {
    /// Context with `tag` as its base culture. An empty tag selects the
    /// invariant culture.
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            current: Observable::new(normalize_culture(tag)),
            overrides: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Context initialized from `LC_ALL` / `LANG`.
    #[must_use]
    pub fn system() -> Self {
        Self::new(&detect_system_culture())
    }

    /// The thread's shared context.
    #[must_use]
    pub fn global() -> Self {
        GLOBAL_CULTURE.with(Clone::clone)
    }

    /// Active culture, honoring the innermost override.
    #[must_use]
    pub fn current_culture(&self) -> String {
        if let Some(tag) = self.overrides.borrow().last() {
            tag.clone()
        } else {
            self.current.get()
        }
    }

    #[must_use]
    pub fn base_culture(&self) -> String {
        self.current.get()
    }

    pub fn set_culture(&self, tag: &str) {
        self.current.set(normalize_culture(tag));
    }

    /// Observe base culture changes.
    pub fn subscribe(&self, callback: impl Fn(&String) + 'static) -> Subscription {
        self.current.subscribe(callback)
    }

    /// Format under `tag` until the guard drops.
    #[must_use = "dropping this guard clears the culture override"]
    pub fn push_override(&self, tag: &str) -> CultureOverride {
        self.overrides.borrow_mut().push(normalize_culture(tag));
        CultureOverride {
            stack: Rc::clone(&self.overrides),
        }
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.current.version()
    }

    /// Number conventions of the active culture.
    #[must_use]
    pub fn format_info(&self) -> FormatInfo {
        FormatInfo::for_culture(&self.current_culture())
    }
}

/// Guard returned by [`CultureContext::push_override`].
#[must_use = "dropping this guard clears the culture override"]
pub struct CultureOverride {
    stack: Rc<RefCell<Vec<String>>>,
}

impl Drop for CultureOverride {
    fn drop(&mut self) {
        self.stack.borrow_mut().pop();
    }
}

/// Culture tag from the environment: `LC_ALL`, then `LANG`. Empty (the
/// invariant culture) when neither names one.
#[must_use]
pub fn detect_system_culture() -> String {
    let lc_all = env::var("LC_ALL").ok();
    let lang = env::var("LANG").ok();
    detect_culture_from(lc_all.as_deref(), lang.as_deref())
}

fn detect_culture_from(lc_all: Option<&str>, lang: Option<&str>) -> String {
    lc_all
        .and_then(normalize_culture_raw)
        .or_else(|| lang.and_then(normalize_culture_raw))
        .unwrap_or_default()
}

fn normalize_culture(tag: &str) -> String {
    normalize_culture_raw(tag).unwrap_or_default()
}

/// `fr_FR.UTF-8@euro` becomes `fr-FR`; `C` and `POSIX` mean invariant.
fn normalize_culture_raw(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let raw = raw.split('@').next().unwrap_or(raw);
    let raw = raw.split('.').next().unwrap_or(raw).trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("c") || raw.eq_ignore_ascii_case("posix") {
        return None;
    }
    Some(raw.replace('_', "-"))
}
