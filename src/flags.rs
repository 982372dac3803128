use clap::ValueEnum;
use refhunt_core::index::UnknownDependencyPolicy;
use refhunt_core::query::{AddressableFilter, SortDirection, SortField, SortMode};

#[derive(Copy, Clone, ValueEnum)]
pub(crate) enum SortFlag {
    Type,
    Path,
    Size,
}

impl SortFlag {
    pub(crate) const fn as_domain(self, descending: bool) -> SortMode {
        let field = match self {
            SortFlag::Type => SortField::Type,
            SortFlag::Path => SortField::Path,
            SortFlag::Size => SortField::Size,
        };
        let direction = if descending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        SortMode { field, direction }
    }
}

#[derive(Copy, Clone, ValueEnum)]
pub(crate) enum AddressableFlag {
    All,
    Only,
    Exclude,
}

impl AddressableFlag {
    pub(crate) const fn as_domain(self) -> AddressableFilter {
        match self {
            AddressableFlag::All => AddressableFilter::All,
            AddressableFlag::Only => AddressableFilter::Only,
            AddressableFlag::Exclude => AddressableFilter::Exclude,
        }
    }
}

#[derive(Copy, Clone, ValueEnum)]
pub(crate) enum DanglingFlag {
    Ignore,
    Report,
}

impl DanglingFlag {
    pub(crate) const fn as_domain(self) -> UnknownDependencyPolicy {
        match self {
            DanglingFlag::Ignore => UnknownDependencyPolicy::Ignore,
            DanglingFlag::Report => UnknownDependencyPolicy::Report,
        }
    }
}
