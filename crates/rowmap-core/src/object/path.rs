use crate::{Error, Result};

use std::{fmt, str::FromStr};

/// A dotted, optionally indexed property path such as `author.posts[0].title`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath {
    /// Segments leading to the last one
    parents: Vec<PathSegment>,
    last: PathSegment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub name: String,

    /// Text between brackets: a list position or a map key
    pub index: Option<String>,
}

impl PropertyPath {
    pub fn parse(path: &str) -> Result<PropertyPath> {
        let (parents, last) = match path.rsplit_once('.') {
            Some((parents, last)) => (Some(parents), last),
            None => (None, path),
        };

        let parents = parents
            .into_iter()
            .flat_map(|parents| parents.split('.'))
            .map(|segment| PathSegment::parse(segment, path))
            .collect::<Result<Vec<_>>>()?;

        Ok(PropertyPath {
            parents,
            last: PathSegment::parse(last, path)?,
        })
    }

    pub fn segments(&self) -> impl Iterator<Item = &PathSegment> {
        self.parents.iter().chain(core::iter::once(&self.last))
    }

    pub fn depth(&self) -> usize {
        self.parents.len() + 1
    }

    pub fn is_nested(&self) -> bool {
        !self.parents.is_empty()
    }

    /// Segments leading to the last one.
    pub fn parents(&self) -> &[PathSegment] {
        &self.parents
    }

    pub fn last(&self) -> &PathSegment {
        &self.last
    }
}

impl PathSegment {
    fn parse(segment: &str, path: &str) -> Result<PathSegment> {
        let invalid = || Error::invalid_schema(format!("invalid property path `{path}`"));

        let (name, index) = match segment.find('[') {
            Some(open) => {
                let index = segment[open + 1..]
                    .strip_suffix(']')
                    .ok_or_else(invalid)?;
                (&segment[..open], Some(index.to_string()))
            }
            None => (segment, None),
        };

        if name.is_empty() {
            return Err(invalid());
        }

        Ok(PathSegment {
            name: name.to_string(),
            index,
        })
    }

    /// The index as a list position, when it is numeric.
    pub fn position(&self) -> Option<usize> {
        self.index.as_deref()?.parse().ok()
    }
}

impl FromStr for PropertyPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PropertyPath::parse(s)
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&segment.name)?;
            if let Some(index) = &segment.index {
                write!(f, "[{index}]")?;
            }
        }
        Ok(())
    }
}
