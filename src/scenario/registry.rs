//! The foreign-attribute registry: the cross-object attribute contract.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value as Json;

use crate::error::{ParseErrorKind, ParseResult};
use crate::rules::{Level, ParseContext, Scope};
use crate::schema;

/// The attributes every team, player and ship must carry so that event
/// handlers can read them off foreign objects.
///
/// Declared in `foreign-attributes.json`; an absent document means an empty
/// contract. Only the team, player and ship levels can carry foreign
/// attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForeignRegistry {
    names: BTreeMap<Level, BTreeSet<String>>,
}

impl ForeignRegistry {
    /// Parse the `foreign-attributes.json` document.
    pub(crate) fn build(cx: &ParseContext<'_>, json: &Json) -> ParseResult<Self> {
        let obj = schema::object(cx, json)?;
        schema::forbid_unknown(cx, obj, &["team", "player", "ship"])?;
        let mut registry = ForeignRegistry::default();
        for (field, level) in [
            ("team", Level::Team),
            ("player", Level::Player),
            ("ship", Level::Ship),
        ] {
            let Some(raw) = obj.get(field) else {
                continue;
            };
            let list_cx = cx.field(field);
            for (i, entry) in schema::array(&list_cx, raw)?.iter().enumerate() {
                let name = schema::string(&list_cx.index(i), entry)?;
                registry.declare(level, name);
            }
        }
        Ok(registry)
    }

    pub(crate) fn declare(&mut self, level: Level, name: &str) {
        self.names.entry(level).or_default().insert(name.to_owned());
    }

    /// Whether `name` is declared for `level`.
    #[must_use]
    pub fn contains(&self, level: Level, name: &str) -> bool {
        self.names.get(&level).is_some_and(|set| set.contains(name))
    }

    /// The declared names for one level, in sorted order.
    pub fn names(&self, level: Level) -> impl Iterator<Item = &str> {
        self.names
            .get(&level)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Whether the contract declares nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.values().all(BTreeSet::is_empty)
    }

    /// Check that a parsed attribute map carries every declared name.
    pub(crate) fn enforce(
        &self,
        cx: &ParseContext<'_>,
        level: Level,
        scope: &Scope,
    ) -> ParseResult<()> {
        for name in self.names(level) {
            if !scope.contains_key(name) {
                return Err(cx.error(ParseErrorKind::RegistryMissing {
                    level,
                    name: name.to_owned(),
                }));
            }
        }
        Ok(())
    }
}
