//! SQL schema definitions.

/// Complete schema for the v1 database.
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Distribution rules (one row per rule category)
-- ============================================================

CREATE TABLE IF NOT EXISTS distribution_rules (
    category TEXT PRIMARY KEY CHECK (category IN (
        'treasury', 'mutual_fund', 'solidarity_fund', 'training_fund',
        'equipment_fund', 'performance_bonus', 'pursuers'
    )),
    base_bp INTEGER NOT NULL CHECK (base_bp BETWEEN 0 AND 10000),
    max_bp INTEGER NOT NULL CHECK (max_bp BETWEEN 0 AND 10000),
    min_amount INTEGER,
    max_amount INTEGER,
    min_headcount INTEGER,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS levy_rule (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    threshold INTEGER NOT NULL,
    rate_bp INTEGER NOT NULL CHECK (rate_bp BETWEEN 0 AND 10000),
    reduced_rate_bp INTEGER NOT NULL CHECK (reduced_rate_bp BETWEEN 0 AND 10000),
    updated_at INTEGER NOT NULL
);

-- ============================================================
-- Distribution history
-- ============================================================

CREATE TABLE IF NOT EXISTS distribution_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    case_id TEXT NOT NULL,
    actor TEXT NOT NULL,
    computed_at INTEGER NOT NULL,
    total_amount INTEGER NOT NULL,
    net_amount INTEGER NOT NULL,
    levy_amount INTEGER NOT NULL,
    treasury_amount INTEGER NOT NULL DEFAULT 0,
    mutual_fund_amount INTEGER NOT NULL DEFAULT 0,
    solidarity_fund_amount INTEGER NOT NULL DEFAULT 0,
    training_fund_amount INTEGER NOT NULL DEFAULT 0,
    equipment_fund_amount INTEGER NOT NULL DEFAULT 0,
    performance_bonus_amount INTEGER NOT NULL DEFAULT 0,
    line_items TEXT NOT NULL,
    params TEXT NOT NULL,
    verified INTEGER NOT NULL,
    messages TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_history_case ON distribution_history(case_id, computed_at);

-- ============================================================
-- Settings
-- ============================================================

CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;
