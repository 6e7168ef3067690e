//! Lexicographically sortable "key between two keys" generator.
//!
//! Backs `operators::topk`'s output ordering: every emitted row carries one
//! of these strings, and sorting rows by the string reproduces the window's
//! comparator order (the "fractional-index monotonicity" invariant).
//!
//! The algorithm below is the standard base62 "fractional indexing"
//! midpoint construction (common prefix stripped, then a digit-by-digit
//! recursive midpoint with a no-trailing-zero invariant so a key can always
//! be generated strictly below any non-empty upper bound).

/// Base62 digit alphabet, in ascending sort order.
const ALPHABET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

fn digit_index(c: char) -> usize {
    ALPHABET.find(c).expect("key contains only alphabet digits")
}

fn digit_char(i: usize) -> char {
    ALPHABET.as_bytes()[i] as char
}

/// Returns a key that sorts strictly between `lo` and `hi`.
///
/// `lo = None` means "no lower bound" (insert at the very start); `hi =
/// None` means "no upper bound" (insert at the very end). Panics if `lo >=
/// hi` when both are present, or if either ends in the alphabet's zero
/// digit — both indicate a caller bug (the kernel never passes such a key
/// itself; see the no-trailing-zero invariant above).
///
/// # Examples
///
/// ```
/// use diffkernel::fractional::key_between;
///
/// let a = key_between(None, None);
/// let b = key_between(Some(&a), None);
/// let c = key_between(Some(&a), Some(&b));
/// let mut keys = vec![a.clone(), b.clone(), c.clone()];
/// keys.sort();
/// assert_eq!(keys, vec![a, c, b]);
/// ```
pub fn key_between(lo: Option<&str>, hi: Option<&str>) -> String {
    if let Some(lo) = lo {
        assert!(!lo.ends_with('0'), "key must not end in the zero digit: {lo:?}");
    }
    if let Some(hi) = hi {
        assert!(!hi.ends_with('0'), "key must not end in the zero digit: {hi:?}");
    }
    if let (Some(lo), Some(hi)) = (lo, hi) {
        assert!(lo < hi, "key_between requires lo < hi, got {lo:?} >= {hi:?}");
    }

    let a = lo.unwrap_or("");
    match hi {
        None => midpoint(a, None),
        Some(b) => {
            // Strip the common prefix (treating a's missing chars as '0').
            let mut n = 0;
            let a_chars: Vec<char> = a.chars().collect();
            let b_chars: Vec<char> = b.chars().collect();
            while n < b_chars.len() && a_chars.get(n).copied().unwrap_or('0') == b_chars[n] {
                n += 1;
            }
            if n > 0 {
                let prefix: String = b_chars[..n].iter().collect();
                let a_rest: String = a_chars.get(n..).unwrap_or(&[]).iter().collect();
                let b_rest: String = b_chars[n..].iter().collect();
                prefix + &midpoint(&a_rest, Some(&b_rest))
            } else {
                midpoint(a, Some(b))
            }
        }
    }
}

/// Digit-by-digit midpoint of `a` (possibly empty, meaning "all zero
/// digits below here") and `b` (`None` meaning unbounded above), assuming
/// any shared prefix has already been stripped.
fn midpoint(a: &str, b: Option<&str>) -> String {
    let digit_a = a.chars().next().map(digit_index).unwrap_or(0);
    let digit_b = match b {
        Some(b) => b.chars().next().map(digit_index).unwrap_or(ALPHABET.len()),
        None => ALPHABET.len(),
    };

    if digit_b.saturating_sub(digit_a) > 1 {
        let mid = digit_a + (digit_b - digit_a) / 2;
        digit_char(mid).to_string()
    } else if let Some(b) = b {
        if b.chars().count() > 1 {
            b.chars().next().unwrap().to_string()
        } else {
            // `b` ends exactly at this digit (e.g. "1" with digit_b == 1),
            // so there is no room to use digit_b itself as a shared prefix
            // the way the `count() > 1` arm does — any key starting with
            // digit_b and continuing further would sort *above* `b`, not
            // below it (`"1" < "1V"`). Stay at digit_a instead (always
            // strictly below digit_b here) and recurse unbounded below it.
            let rest = a.get(a.char_indices().nth(1).map(|(i, _)| i).unwrap_or(a.len())..).unwrap_or("");
            format!("{}{}", digit_char(digit_a), midpoint(rest, None))
        }
    } else {
        let mid = if digit_a == 0 { 1 } else { digit_a };
        let rest = a.get(a.char_indices().nth(1).map(|(i, _)| i).unwrap_or(a.len())..).unwrap_or("");
        format!("{}{}", digit_char(mid), midpoint(rest, None))
    }
}
