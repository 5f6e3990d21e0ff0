pub struct Icons;

impl Icons {
    pub const BOOK: &str = "📖";
    pub const PERSON: &str = "👤";
    pub const LOAN: &str = "🤝";
    pub const SEARCH: &str = "🔍";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const STATS: &str = "📊";
    pub const EXPORT: &str = "📤";
    pub const IMPORT: &str = "📥";
    pub const SEED: &str = "🌱";
    pub const DEL: &str = "🗑️";
    pub const EMPTY: &str = "∅";
}
