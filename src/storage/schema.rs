//! Database schema definitions

/// SQL to create the people table
pub const CREATE_PEOPLE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS people (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    birth_year TEXT,
    eye_color TEXT,
    gender TEXT,
    hair_color TEXT,
    height TEXT,
    mass TEXT,
    skin_color TEXT,
    homeworld TEXT,
    films TEXT,
    species TEXT,
    starships TEXT,
    vehicles TEXT
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_people_name ON people(name)",
];

/// Column list shared by inserts and selects, in `Person` field order
pub const PEOPLE_COLUMNS: &str = "id, name, birth_year, eye_color, gender, hair_color, height, mass, skin_color, homeworld, films, species, starships, vehicles";

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_PEOPLE_TABLE];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
