use crate::person::Person;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
struct PersonRow {
    #[tabled(rename = "Id")]
    id: u32,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Born")]
    birth_year: String,
    #[tabled(rename = "Homeworld")]
    homeworld: String,
    #[tabled(rename = "Films")]
    films: usize,
    #[tabled(rename = "Species")]
    species: String,
}

impl From<&Person> for PersonRow {
    fn from(person: &Person) -> Self {
        Self {
            id: person.id,
            name: person.name.clone(),
            birth_year: person.birth_year.clone().unwrap_or_else(|| "-".to_string()),
            homeworld: person.homeworld.clone(),
            films: count_names(&person.films),
            species: person.species.clone(),
        }
    }
}

/// Number of names in a `", "`-joined relation string.
fn count_names(joined: &str) -> usize {
    if joined.is_empty() {
        0
    } else {
        joined.split(crate::client::resolver::NAME_SEPARATOR).count()
    }
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }
        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

/// One row per person, with the film list collapsed to a count.
pub fn people_table(people: &[Person]) -> String {
    if people.is_empty() {
        return String::new();
    }
    let rows: Vec<PersonRow> = people.iter().map(PersonRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}
