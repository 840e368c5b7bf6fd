fn normalize_token(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.')
        .collect()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];
    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

fn score_candidate(input: &str, candidate: &str) -> Option<usize> {
    let a = normalize_token(input);
    let b = normalize_token(candidate);
    if a.is_empty() || b.is_empty() {
        return None;
    }
    if a == b {
        return Some(0);
    }
    if a.contains(&b) || b.contains(&a) {
        return Some(1);
    }
    let allowed = match a.len() {
        0..=4 => 1,
        5..=8 => 2,
        len => ((len as f32) * 0.35).floor().max(3.0) as usize,
    };
    let distance = levenshtein(&a, &b);
    (distance <= allowed).then_some(distance)
}

pub fn suggest<'a, I>(input: &str, candidates: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut scored: Vec<(&str, usize)> = candidates
        .into_iter()
        .filter_map(|candidate| score_candidate(input, candidate).map(|score| (candidate, score)))
        .collect();
    scored.sort_by(|a, b| {
        a.1.cmp(&b.1)
            .then_with(|| a.0.len().cmp(&b.0.len()))
            .then_with(|| a.0.cmp(b.0))
    });
    scored.dedup_by(|a, b| a.0 == b.0);
    scored
        .into_iter()
        .take(limit.max(1))
        .map(|(candidate, _)| candidate.to_string())
        .collect()
}

pub fn did_you_mean<'a, I>(input: &str, candidates: I, limit: usize) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let found = suggest(input, candidates, limit);
    if found.is_empty() {
        None
    } else {
        Some(format!("Did you mean: {}?", found.join(", ")))
    }
}
