//! Response envelopes
//!
//! JSON shapes:
//! - `Many<T>`: `{ "value": [..], "items": n, "@nextLink"?, "@deltaLink"? }`
//! - `CountMany<T>`: `Many<T>` plus `"maxItems": total`
//! - `One<T>`: `{ "value": T?, "found": bool, "error": bool }`
//!
//! Links are omitted when absent or blank.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

fn link(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|l| !l.trim().is_empty())
}

/// A page of rows
#[derive(Debug, Clone, PartialEq)]
pub struct Many<T> {
    /// `None` under `Prefer: return=minimal` when no row matched
    pub value: Option<Vec<T>>,
    pub next_link: Option<String>,
    pub delta_link: Option<String>,
}

impl<T> Many<T> {
    pub fn new(value: Option<Vec<T>>, next_link: Option<String>, delta_link: Option<String>) -> Self {
        Self {
            value,
            next_link,
            delta_link,
        }
    }

    /// Number of rows in this page
    pub fn items(&self) -> usize {
        self.value.as_ref().map_or(0, Vec::len)
    }

    /// Adds the total row count
    pub fn with_count(self, max_items: usize) -> CountMany<T> {
        CountMany {
            value: self.value,
            max_items,
            next_link: self.next_link,
            delta_link: self.delta_link,
        }
    }
}

impl<T> Default for Many<T> {
    fn default() -> Self {
        Self::new(Some(Vec::new()), None, None)
    }
}

impl<T: Serialize> Serialize for Many<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("value", &self.value)?;
        map.serialize_entry("items", &self.items())?;
        if let Some(next) = link(&self.next_link) {
            map.serialize_entry("@nextLink", next)?;
        }
        if let Some(delta) = link(&self.delta_link) {
            map.serialize_entry("@deltaLink", delta)?;
        }
        map.end()
    }
}

/// A page of rows with the total matching count
#[derive(Debug, Clone, PartialEq)]
pub struct CountMany<T> {
    pub value: Option<Vec<T>>,
    /// Rows matching the filter, ignoring paging
    pub max_items: usize,
    pub next_link: Option<String>,
    pub delta_link: Option<String>,
}

impl<T> CountMany<T> {
    pub fn items(&self) -> usize {
        self.value.as_ref().map_or(0, Vec::len)
    }
}

impl<T: Serialize> Serialize for CountMany<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("value", &self.value)?;
        map.serialize_entry("items", &self.items())?;
        map.serialize_entry("maxItems", &self.max_items)?;
        if let Some(next) = link(&self.next_link) {
            map.serialize_entry("@nextLink", next)?;
        }
        if let Some(delta) = link(&self.delta_link) {
            map.serialize_entry("@deltaLink", delta)?;
        }
        map.end()
    }
}

/// Collection result: counted when the query asked for a total
#[derive(Debug, Clone, PartialEq)]
pub enum Page<T> {
    Many(Many<T>),
    Counted(CountMany<T>),
}

impl<T> Page<T> {
    pub fn value(&self) -> Option<&[T]> {
        match self {
            Page::Many(m) => m.value.as_deref(),
            Page::Counted(c) => c.value.as_deref(),
        }
    }

    pub fn items(&self) -> usize {
        self.value().map_or(0, <[T]>::len)
    }

    /// Total count, when requested
    pub fn max_items(&self) -> Option<usize> {
        match self {
            Page::Many(_) => None,
            Page::Counted(c) => Some(c.max_items),
        }
    }

    pub fn next_link(&self) -> Option<&str> {
        match self {
            Page::Many(m) => link(&m.next_link),
            Page::Counted(c) => link(&c.next_link),
        }
    }

    pub fn delta_link(&self) -> Option<&str> {
        match self {
            Page::Many(m) => link(&m.delta_link),
            Page::Counted(c) => link(&c.delta_link),
        }
    }

    /// Consumes the page, returning its rows
    pub fn into_value(self) -> Option<Vec<T>> {
        match self {
            Page::Many(m) => m.value,
            Page::Counted(c) => c.value,
        }
    }

    /// Converts every row, keeping links and count
    pub fn try_map<U, E>(self, mut f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        let mut convert = |value: Option<Vec<T>>| -> Result<Option<Vec<U>>, E> {
            value
                .map(|rows| rows.into_iter().map(&mut f).collect::<Result<Vec<U>, E>>())
                .transpose()
        };
        Ok(match self {
            Page::Many(m) => Page::Many(Many {
                value: convert(m.value)?,
                next_link: m.next_link,
                delta_link: m.delta_link,
            }),
            Page::Counted(c) => Page::Counted(CountMany {
                value: convert(c.value)?,
                max_items: c.max_items,
                next_link: c.next_link,
                delta_link: c.delta_link,
            }),
        })
    }
}

impl<T: Serialize> Serialize for Page<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Page::Many(m) => m.serialize(serializer),
            Page::Counted(c) => c.serialize(serializer),
        }
    }
}

/// A single item lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct One<T> {
    pub value: Option<T>,
    pub found: bool,
    pub error: bool,
}

impl<T> One<T> {
    pub fn found(value: T) -> Self {
        Self {
            value: Some(value),
            found: true,
            error: false,
        }
    }

    /// Found, with the representation withheld
    pub fn found_minimal() -> Self {
        Self {
            value: None,
            found: true,
            error: false,
        }
    }

    pub fn missing() -> Self {
        Self {
            value: None,
            found: false,
            error: false,
        }
    }

    /// Converts the value, keeping the flags
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<One<U>, E> {
        Ok(One {
            value: self.value.map(f).transpose()?,
            found: self.found,
            error: self.error,
        })
    }
}
