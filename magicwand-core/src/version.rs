use std::cmp::Ordering;

/// Compares dotted version strings token by token: numeric when both tokens
/// parse as integers, lexicographic otherwise. An absent version sorts below
/// any present one, even the empty string. On a tied prefix the shorter
/// version sorts first, so "1.2" < "1.2.0".
pub fn compare(lhs: Option<&str>, rhs: Option<&str>) -> Ordering {
    let (lhs, rhs) = match (lhs, rhs) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Less,
        (Some(_), None) => return Ordering::Greater,
        (Some(l), Some(r)) => (l, r),
    };

    let lhs_tokens: Vec<&str> = lhs.split('.').collect();
    let rhs_tokens: Vec<&str> = rhs.split('.').collect();

    for (l, r) in lhs_tokens.iter().zip(rhs_tokens.iter()) {
        let ordering = match (l.parse::<i64>(), r.parse::<i64>()) {
            (Ok(li), Ok(ri)) => li.cmp(&ri),
            _ => l.cmp(r),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    lhs_tokens.len().cmp(&rhs_tokens.len())
}
