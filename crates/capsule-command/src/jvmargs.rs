/// The family a JVM flag belongs to, for de-duplication purposes: when two
/// flags collapse to the same family, only the right-most (later) one
/// survives the merge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum OptionFamily {
    HeapMax,
    HeapInit,
    XxFlag(String),
    BootClassPath,
    ClassPath,
    Other(String),
}

/// Classify a single JVM argument token into its merge family.
///
/// `-cp`/`-classpath` consume the following token as part of the same
/// logical unit; callers merging whole argument lists should treat such
/// pairs atomically (see [`merge_keyed`]).
pub fn jvm_arg_key(flag: &str) -> OptionFamily {
    if flag.starts_with("-Xmx") {
        return OptionFamily::HeapMax;
    }
    if flag.starts_with("-Xms") {
        return OptionFamily::HeapInit;
    }
    if let Some(name) = flag.strip_prefix("-XX:+").or_else(|| flag.strip_prefix("-XX:-")) {
        return OptionFamily::XxFlag(name.to_string());
    }
    if flag.starts_with("-Xbootclasspath") {
        return OptionFamily::BootClassPath;
    }
    if flag == "-cp" || flag == "-classpath" {
        return OptionFamily::ClassPath;
    }
    OptionFamily::Other(flag.to_string())
}

/// Merge two JVM argument lists, `left` (e.g. manifest-declared) and
/// `right` (e.g. a host-supplied override), such that within any shared
/// option family the right-most occurrence wins. Order of first
/// appearance is otherwise preserved.
pub fn merge_keyed(left: &[String], right: &[String]) -> Vec<String> {
    let mut combined: Vec<String> = Vec::new();
    combined.extend_from_slice(left);
    combined.extend_from_slice(right);

    let mut family_last_index: std::collections::HashMap<OptionFamily, usize> =
        std::collections::HashMap::new();

    let mut i = 0;
    while i < combined.len() {
        let flag = &combined[i];
        let key = jvm_arg_key(flag);
        let consumes_next = matches!(key, OptionFamily::ClassPath) && i + 1 < combined.len();
        family_last_index.insert(key, i);
        i += if consumes_next { 2 } else { 1 };
    }

    let mut out = Vec::new();
    let mut i = 0;
    while i < combined.len() {
        let flag = &combined[i];
        let key = jvm_arg_key(flag);
        let consumes_next = matches!(key, OptionFamily::ClassPath) && i + 1 < combined.len();
        if family_last_index.get(&key) == Some(&i) {
            out.push(flag.clone());
            if consumes_next {
                out.push(combined[i + 1].clone());
            }
        }
        i += if consumes_next { 2 } else { 1 };
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heap_max_family_keeps_rightmost() {
        let left = vec!["-Xmx512m".to_string()];
        let right = vec!["-Xmx2g".to_string()];
        let merged = merge_keyed(&left, &right);
        assert_eq!(merged, vec!["-Xmx2g".to_string()]);
    }

    #[test]
    fn distinct_families_both_survive() {
        let left = vec!["-Xmx512m".to_string()];
        let right = vec!["-Xms128m".to_string()];
        let merged = merge_keyed(&left, &right);
        assert_eq!(merged, vec!["-Xmx512m".to_string(), "-Xms128m".to_string()]);
    }

    #[test]
    fn classpath_pair_treated_atomically() {
        let left = vec!["-cp".to_string(), "a.jar".to_string()];
        let right = vec!["-cp".to_string(), "b.jar".to_string()];
        let merged = merge_keyed(&left, &right);
        assert_eq!(merged, vec!["-cp".to_string(), "b.jar".to_string()]);
    }

    #[test]
    fn unrelated_other_flags_all_survive() {
        let left = vec!["-ea".to_string()];
        let right = vec!["-server".to_string()];
        let merged = merge_keyed(&left, &right);
        assert_eq!(merged, vec!["-ea".to_string(), "-server".to_string()]);
    }
}
