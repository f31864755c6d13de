use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::LazyLock;

use strsim::damerau_levenshtein;
use unicode_normalization::UnicodeNormalization;

/// Alias -> canonical skill tag. Canonical tags are lowercase and human readable
/// because they are echoed back in match explanations.
static ALIAS_TO_CANONICAL: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let aliases: &[(&str, &[&str])] = &[
        // Languages
        ("python", &["python3", "python 3", "py"]),
        ("javascript", &["js", "java script", "ecmascript", "es6"]),
        ("typescript", &["ts", "type script"]),
        ("java", &["openjdk", "java8", "java11", "java17"]),
        ("c++", &["cpp", "cplusplus", "c plus plus"]),
        ("c#", &["csharp", "c sharp", ".net", "dotnet"]),
        ("go", &["golang", "go lang"]),
        ("rust", &["rust lang", "rustlang"]),
        ("r", &["r language", "r programming", "rstats"]),
        ("sql", &["structured query language", "t-sql", "pl/sql"]),
        // Machine learning and data
        (
            "machine learning",
            &["ml", "machine-learning", "statistical learning"],
        ),
        ("deep learning", &["dl", "neural networks", "deeplearning"]),
        (
            "artificial intelligence",
            &["ai", "a.i.", "artificial-intelligence"],
        ),
        (
            "natural language processing",
            &["nlp", "computational linguistics"],
        ),
        ("computer vision", &["cv", "image recognition", "machine vision"]),
        ("large language models", &["llm", "llms", "large language model"]),
        ("data science", &["data scientist", "datascience"]),
        ("data engineering", &["data engineer", "etl"]),
        ("statistics", &["statistical analysis", "stats"]),
        ("tensorflow", &["tensor flow", "tf"]),
        ("pytorch", &["torch", "py torch"]),
        ("pandas", &["python pandas"]),
        ("spark", &["apache spark", "pyspark"]),
        // Cloud and infrastructure
        ("aws", &["amazon web services", "amazon aws", "aws cloud"]),
        ("gcp", &["google cloud platform", "google cloud"]),
        ("azure", &["microsoft azure", "ms azure"]),
        ("kubernetes", &["k8s", "kube"]),
        ("docker", &["containers", "containerization"]),
        ("terraform", &["infrastructure as code", "iac"]),
        ("distributed systems", &["distributed computing"]),
        // Web
        ("react", &["reactjs", "react.js", "react js"]),
        ("node.js", &["node", "nodejs", "node js"]),
        ("postgresql", &["postgres", "psql"]),
        // Research, product and creative work
        ("research", &["academic research", "scientific research"]),
        ("product management", &["product manager", "pm"]),
        ("ux design", &["user experience", "ux", "ux/ui", "ui/ux"]),
        ("blockchain", &["web3", "distributed ledger"]),
        ("bioinformatics", &["computational biology"]),
        ("quantitative finance", &["quant", "quant finance"]),
        ("film production", &["filmmaking", "film making"]),
    ];

    let mut map = HashMap::new();
    for (canonical, alias_list) in aliases {
        map.insert(*canonical, *canonical);
        for alias in *alias_list {
            map.insert(*alias, *canonical);
        }
    }
    map
});

/// Separator-free variant of the alias table. Ordered so that fuzzy lookups
/// resolve ties the same way on every run.
static COMPACT_ALIAS_TO_CANONICAL: LazyLock<BTreeMap<String, &'static str>> =
    LazyLock::new(|| {
        let mut map = BTreeMap::new();
        for (alias, canonical) in ALIAS_TO_CANONICAL.iter() {
            let compact = compact_key(alias);
            if compact.is_empty() {
                continue;
            }
            map.entry(compact)
                .and_modify(|existing: &mut &'static str| {
                    if *canonical < *existing {
                        *existing = *canonical;
                    }
                })
                .or_insert(*canonical);
        }
        map
    });

fn nfkc_lower_trim(input: &str) -> String {
    input
        .nfkc()
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn compact_key(input: &str) -> String {
    input
        .nfkc()
        .collect::<String>()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, ' ' | '.' | '-' | '_' | '/'))
        .collect()
}

/// Real technologies that sit within edit distance of a canonical tag but are
/// not the same skill.
const NEVER_FUZZED: &[&str] = &[
    "containerd",
    "cpython",
    "cython",
    "jython",
    "nodes",
    "postgis",
    "preact",
    "quart",
    "terragrunt",
];

const MIN_FUZZY_LEN: usize = 8;

fn fuzzy_match_canonical(compact: &str) -> Option<&'static str> {
    // Short tokens are only matched exactly: at that length one edit is
    // usually a different technology, not a typo.
    if compact.chars().count() < MIN_FUZZY_LEN || NEVER_FUZZED.contains(&compact) {
        return None;
    }
    let first = compact.chars().next()?;

    let mut best: Option<(&'static str, usize)> = None;
    for (alias, canonical) in COMPACT_ALIAS_TO_CANONICAL.iter() {
        if alias.chars().count() < MIN_FUZZY_LEN || !alias.starts_with(first) {
            continue;
        }

        let distance = damerau_levenshtein(compact, alias);
        let len = compact.chars().count().max(alias.chars().count());
        let acceptable = distance <= 1 || (len >= 10 && distance == 2);
        if !acceptable {
            continue;
        }

        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((*canonical, distance)),
        }
    }

    best.map(|(canonical, _)| canonical)
}

/// Map a free-text skill tag to its canonical comparison form.
///
/// Exact alias hits win, then separator-insensitive hits, then a bounded
/// Damerau-Levenshtein fallback for typos in longer tags. Unknown tags are
/// returned lowercased with whitespace collapsed.
pub fn normalize_skill(skill: &str) -> String {
    let normalized = nfkc_lower_trim(skill);
    if normalized.is_empty() {
        return normalized;
    }

    if let Some(canonical) = ALIAS_TO_CANONICAL.get(normalized.as_str()) {
        return (*canonical).to_string();
    }

    let compact = compact_key(&normalized);
    if let Some(canonical) = COMPACT_ALIAS_TO_CANONICAL.get(&compact) {
        return (*canonical).to_string();
    }

    fuzzy_match_canonical(&compact)
        .map(str::to_string)
        .unwrap_or(normalized)
}

/// Normalize a list of skill tags into a set, dropping blanks.
pub fn normalize_skill_set<S: AsRef<str>>(skills: impl IntoIterator<Item = S>) -> BTreeSet<String> {
    skills
        .into_iter()
        .map(|s| normalize_skill(s.as_ref()))
        .filter(|s| !s.is_empty())
        .collect()
}
