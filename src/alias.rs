use crate::config::FilterConfig;
use crate::model::{Dataset, Identity};
use crate::util::case_insensitive_cmp;
use std::collections::BTreeSet;

/// Returns `identity` with its name replaced by the configured real name.
///
/// Alias rules are matched by exact name. When several rules list the same
/// alias, the first rule in configured order wins.
pub fn resolve(identity: &Identity, config: &FilterConfig) -> Identity {
    match real_name(&identity.name, config) {
        Some(name) => Identity {
            name: name.to_string(),
            ..identity.clone()
        },
        None => identity.clone(),
    }
}

pub fn real_name<'a>(name: &str, config: &'a FilterConfig) -> Option<&'a str> {
    config
        .author_aliases
        .iter()
        .find(|rule| rule.aliases.iter().any(|a| a == name))
        .map(|rule| rule.real_name.as_str())
}

/// All author names in the dataset with aliases resolved, sorted and de-duplicated.
pub fn real_author_names(dataset: &Dataset, config: &FilterConfig) -> Vec<String> {
    let names: BTreeSet<String> = dataset
        .commits()
        .map(|(_, c)| {
            real_name(&c.author.name, config)
                .unwrap_or(&c.author.name)
                .to_string()
        })
        .collect();
    sorted_names(names)
}

/// All author names as recorded, ignoring aliases.
pub fn raw_author_names(dataset: &Dataset) -> Vec<String> {
    let names: BTreeSet<String> = dataset
        .commits()
        .map(|(_, c)| c.author.name.clone())
        .collect();
    sorted_names(names)
}

fn sorted_names(names: BTreeSet<String>) -> Vec<String> {
    let mut result: Vec<String> = names.into_iter().collect();
    result.sort_by(|a, b| case_insensitive_cmp(a, b));
    result
}
