use itertools::Itertools;

pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Ratio of the largest sample to the mean. A sample of all zeros is
/// perfectly balanced.
pub fn skew(data: &[f64]) -> Option<f64> {
    let mean = mean(data)?;
    let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if mean == 0.0 {
        return Some(1.0);
    }
    Some(max / mean)
}

pub fn quoted_list<I, T>(items: I) -> String
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    items
        .into_iter()
        .map(|x| format!("{:?}", x.as_ref()))
        .join(", ")
}
