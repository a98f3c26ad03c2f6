//! Interned identifiers for element names and qualified paths.
//!
//! Element names are compared constantly during feature lookup and
//! redefinition matching, so they are interned once and handled as [`Id`]
//! symbols afterwards. Qualified names are interned as whole `::`-joined
//! paths.

use std::{
    cmp::Ordering,
    fmt,
    sync::{Mutex, OnceLock},
};

use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Separator between segments of a qualified name.
pub const PATH_SEPARATOR: &str = "::";

/// Global string interner shared by every model in the process.
///
/// # Thread Safety
///
/// Access goes through a `Mutex`; symbols themselves are plain `Copy` values
/// and can be shared across threads freely.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn with_interner<R>(f: impl FnOnce(&mut DefaultStringInterner) -> R) -> R {
    let mut interner = INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    f(&mut interner)
}

/// Interned identifier.
///
/// # Examples
///
/// ```
/// use partscope_core::identifier::Id;
///
/// let package = Id::new("Workshop");
/// let part = package.join(Id::new("Reindeer"));
/// assert_eq!(part, "Workshop::Reindeer");
/// assert_eq!(part.last_segment(), "Reindeer");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Interns `name` and returns its identifier.
    pub fn new(name: &str) -> Self {
        Self(with_interner(|interner| interner.get_or_intern(name)))
    }

    /// Creates the synthetic identifier used for unnamed elements.
    ///
    /// The `idx` is the element's position in its model, which keeps the
    /// resulting qualified paths unique.
    pub fn anonymous(idx: usize) -> Self {
        Self::new(&format!("__{idx}"))
    }

    /// Joins `child` onto this path with the `::` separator.
    pub fn join(&self, child: Id) -> Self {
        let joined = with_interner(|interner| {
            let parent = interner.resolve(self.0).unwrap_or_default().to_owned();
            let child = interner.resolve(child.0).unwrap_or_default().to_owned();
            interner.get_or_intern(format!("{parent}{PATH_SEPARATOR}{child}"))
        });
        Self(joined)
    }

    /// Returns the interned text.
    pub fn as_string(&self) -> String {
        with_interner(|interner| interner.resolve(self.0).unwrap_or_default().to_owned())
    }

    /// Returns the path segments of this identifier.
    pub fn segments(&self) -> Vec<String> {
        self.as_string()
            .split(PATH_SEPARATOR)
            .map(str::to_owned)
            .collect()
    }

    /// Returns the last path segment, or the whole text for simple names.
    pub fn last_segment(&self) -> String {
        let text = self.as_string();
        match text.rsplit_once(PATH_SEPARATOR) {
            Some((_, last)) => last.to_owned(),
            None => text,
        }
    }

    /// Orders two paths segment by segment.
    ///
    /// `A::z` sorts before `A::y::b` only if `z < y`; plain string ordering
    /// would let the separator characters take part in the comparison.
    pub fn cmp_path(&self, other: &Id) -> Ordering {
        self.segments().cmp(&other.segments())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Id {
    /// Allows direct comparison with string slices: `id == "weight"`.
    fn eq(&self, other: &str) -> bool {
        with_interner(|interner| interner.resolve(self.0) == Some(other))
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}
