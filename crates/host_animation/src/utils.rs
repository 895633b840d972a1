/// Returns `name` if it is free, otherwise the first of `name1`, `name2`, ... that is.
pub fn unique_name(name: &str, is_taken: impl Fn(&str) -> bool) -> String {
    if !is_taken(name) {
        return name.to_string();
    }

    let mut suffix = 1usize;
    loop {
        let candidate = format!("{name}{suffix}");
        if !is_taken(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_name_is_kept() {
        assert_eq!(unique_name("walk", |_| false), "walk");
    }

    #[test]
    fn taken_name_gets_first_free_suffix() {
        let taken = ["walk", "walk1", "walk2"];
        assert_eq!(unique_name("walk", |n| taken.contains(&n)), "walk3");
    }
}
