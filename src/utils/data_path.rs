use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

pub fn parse_path(path: &str) -> Vec<PathSegment> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_brackets = false;
    for ch in path.trim().chars() {
        match ch {
            '.' if !in_brackets => {
                if !current.trim().is_empty() {
                    segments.push(segment_from(&current));
                }
                current.clear();
            }
            '[' => {
                if !current.trim().is_empty() {
                    segments.push(segment_from(&current));
                    current.clear();
                }
                in_brackets = true;
            }
            ']' => {
                if !current.trim().is_empty() {
                    segments.push(segment_from(&current));
                }
                current.clear();
                in_brackets = false;
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        segments.push(segment_from(&current));
    }
    segments
}

fn segment_from(raw: &str) -> PathSegment {
    let trimmed = raw.trim().trim_matches('"').trim_matches('\'').trim();
    if let Ok(index) = trimmed.parse::<usize>() {
        return PathSegment::Index(index);
    }
    PathSegment::Key(trimmed.to_string())
}

pub fn lookup_segments<'a>(target: &'a Value, segments: &[PathSegment]) -> Option<&'a Value> {
    let mut current = target;
    for segment in segments {
        current = match segment {
            PathSegment::Key(key) => current.get(key)?,
            PathSegment::Index(index) => current.as_array()?.get(*index)?,
        };
    }
    Some(current)
}

pub fn lookup_in_map<'a>(map: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    if let Some(direct) = map.get(path) {
        return Some(direct);
    }
    let segments = parse_path(path);
    let (first, rest) = segments.split_first()?;
    let PathSegment::Key(first) = first else {
        return None;
    };
    lookup_segments(map.get(first)?, rest)
}
