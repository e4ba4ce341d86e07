//! The mock client's surface, as data.

/// What a model operation resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// An empty array.
    List,
    /// `null`.
    Single,
    /// The JS expression's fields plus a synthesized `id`; recorded in the
    /// model's transient store.
    Echo(&'static str),
    /// `0`.
    Count,
    /// `{ count: 0 }`.
    Batch,
    /// Aggregate buckets with zeroed counts.
    Aggregate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelOperation {
    pub name: &'static str,
    pub resolution: Resolution,
}

const fn op(name: &'static str, resolution: Resolution) -> ModelOperation {
    ModelOperation { name, resolution }
}

/// Per-model record operations. `*OrThrow` lookups resolve to `null`
/// instead of rejecting.
pub const MODEL_OPERATIONS: &[ModelOperation] = &[
    op("findMany", Resolution::List),
    op("findFirst", Resolution::Single),
    op("findFirstOrThrow", Resolution::Single),
    op("findUnique", Resolution::Single),
    op("findUniqueOrThrow", Resolution::Single),
    op("create", Resolution::Echo("args?.data")),
    op("createMany", Resolution::Batch),
    op("createManyAndReturn", Resolution::List),
    op("update", Resolution::Echo("{ ...args?.where, ...args?.data }")),
    op("updateMany", Resolution::Batch),
    op("upsert", Resolution::Echo("{ ...args?.where, ...args?.create, ...args?.update }")),
    op("delete", Resolution::Echo("args?.where")),
    op("deleteMany", Resolution::Batch),
    op("count", Resolution::Count),
    op("aggregate", Resolution::Aggregate),
    op("groupBy", Resolution::List),
];

/// Lifecycle methods on the client instance.
pub const CLIENT_METHODS: &[&str] = &[
    "$connect",
    "$disconnect",
    "$transaction",
    "$queryRaw",
    "$queryRawUnsafe",
    "$executeRaw",
    "$executeRawUnsafe",
    "$on",
    "$use",
    "$extends",
];

/// Model accessors defined as explicit getters. Anything else goes
/// through the proxy fallback.
pub const COMMON_MODELS: &[&str] = &[
    "account",
    "category",
    "comment",
    "order",
    "orderItem",
    "post",
    "product",
    "profile",
    "project",
    "session",
    "tag",
    "task",
    "user",
    "verificationToken",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_verb_set_is_present() {
        let names: Vec<_> = MODEL_OPERATIONS.iter().map(|o| o.name).collect();
        for verb in [
            "findMany", "findFirst", "findUnique", "create", "update", "upsert", "delete",
            "deleteMany", "count", "aggregate", "groupBy",
        ] {
            assert!(names.contains(&verb), "missing {verb}");
        }
    }

    #[test]
    fn writes_echo_and_reads_are_empty() {
        for o in MODEL_OPERATIONS {
            if o.name.starts_with("find") && o.name != "findMany" {
                assert_eq!(o.resolution, Resolution::Single, "{}", o.name);
            }
            if matches!(o.name, "create" | "update") {
                assert!(matches!(o.resolution, Resolution::Echo(_)), "{}", o.name);
            }
        }
    }

    #[test]
    fn operation_names_are_unique() {
        let mut names: Vec<_> = MODEL_OPERATIONS.iter().map(|o| o.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), MODEL_OPERATIONS.len());
    }
}
