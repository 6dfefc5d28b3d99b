use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Ingest {
        file: PathBuf,
    },
    HarvestCreate {
        variety_id: i32,
        field_id: i32,
        client_id: i32,
    },
    HarvestGet {
        id: i32,
    },
    HarvestList,
    ClientCreate {
        email: String,
        first_name: String,
        last_name: String,
    },
    ClientGet {
        id: i32,
    },
    ClientList,
    FarmerCreate {
        email: String,
        first_name: String,
        last_name: String,
    },
    FarmerGet {
        id: i32,
    },
    FarmerList,
    FieldCreate {
        farmer_id: i32,
        name: String,
        location: String,
    },
    FieldGet {
        id: i32,
    },
    FieldList,
    FieldsByFarmer {
        farmer_id: i32,
    },
    FruitCreate {
        name: String,
    },
    FruitGet {
        id: i32,
    },
    FruitList,
    VarietyCreate {
        fruit_id: i32,
        name: String,
    },
    VarietyGet {
        id: i32,
    },
    VarietyList,
    VarietiesByFruit {
        fruit_id: i32,
    },
    Help,
    Unknown(String),
}

pub const USAGE: &str = "commands: ingest <file> | harvest create <variety_id> <field_id> <client_id> | harvest get <id> | harvest list | client create <email> <first> <last> | client get <id> | client list | farmer create <email> <first> <last> | farmer get <id> | farmer list | field create <farmer_id> <name> <location> | field get <id> | field list | field by-farmer <farmer_id> | fruit create <name> | fruit get <id> | fruit list | variety create <fruit_id> <name...> | variety get <id> | variety list | variety by-fruit <fruit_id> | help";

impl AppCommand {
    /// Parses already-split arguments; quoted shell arguments keep their spaces.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Self {
        let parts: Vec<&str> = args.iter().map(|s| s.as_ref()).collect();
        let Some(head) = parts.first() else {
            return AppCommand::Help;
        };
        let sub = parts.get(1).copied();
        let id_at = |i: usize| parts.get(i).and_then(|s| s.parse::<i32>().ok());
        let text_at = |i: usize| parts.get(i).map(|s| s.to_string());

        match *head {
            "ingest" | "upload" => match text_at(1) {
                Some(file) => AppCommand::Ingest {
                    file: PathBuf::from(file),
                },
                None => AppCommand::Unknown("usage: ingest <file>".to_string()),
            },
            "harvest" => match sub {
                Some("create") => match (id_at(2), id_at(3), id_at(4)) {
                    (Some(variety_id), Some(field_id), Some(client_id)) => {
                        AppCommand::HarvestCreate {
                            variety_id,
                            field_id,
                            client_id,
                        }
                    }
                    _ => AppCommand::Unknown(
                        "usage: harvest create <variety_id> <field_id> <client_id>".to_string(),
                    ),
                },
                Some("get") => get_or_usage(id_at(2), "harvest", |id| AppCommand::HarvestGet {
                    id,
                }),
                Some("list") | None => AppCommand::HarvestList,
                Some(other) => unknown_sub("harvest", other),
            },
            "client" => match sub {
                Some("create") => match (text_at(2), text_at(3), text_at(4)) {
                    (Some(email), Some(first_name), Some(last_name)) => AppCommand::ClientCreate {
                        email,
                        first_name,
                        last_name,
                    },
                    _ => AppCommand::Unknown(
                        "usage: client create <email> <first> <last>".to_string(),
                    ),
                },
                Some("get") => {
                    get_or_usage(id_at(2), "client", |id| AppCommand::ClientGet { id })
                }
                Some("list") | None => AppCommand::ClientList,
                Some(other) => unknown_sub("client", other),
            },
            "farmer" => match sub {
                Some("create") => match (text_at(2), text_at(3), text_at(4)) {
                    (Some(email), Some(first_name), Some(last_name)) => AppCommand::FarmerCreate {
                        email,
                        first_name,
                        last_name,
                    },
                    _ => AppCommand::Unknown(
                        "usage: farmer create <email> <first> <last>".to_string(),
                    ),
                },
                Some("get") => {
                    get_or_usage(id_at(2), "farmer", |id| AppCommand::FarmerGet { id })
                }
                Some("list") | None => AppCommand::FarmerList,
                Some(other) => unknown_sub("farmer", other),
            },
            "field" | "fields" => match sub {
                Some("create") => match (id_at(2), text_at(3), text_at(4)) {
                    (Some(farmer_id), Some(name), Some(location)) => AppCommand::FieldCreate {
                        farmer_id,
                        name,
                        location,
                    },
                    _ => AppCommand::Unknown(
                        "usage: field create <farmer_id> <name> <location>".to_string(),
                    ),
                },
                Some("get") => get_or_usage(id_at(2), "field", |id| AppCommand::FieldGet { id }),
                Some("by-farmer") => match id_at(2) {
                    Some(farmer_id) => AppCommand::FieldsByFarmer { farmer_id },
                    None => AppCommand::Unknown("usage: field by-farmer <farmer_id>".to_string()),
                },
                Some("list") | None => AppCommand::FieldList,
                Some(other) => unknown_sub("field", other),
            },
            "fruit" | "fruits" => match sub {
                Some("create") => {
                    let name = parts[2..].join(" ");
                    if name.is_empty() {
                        AppCommand::Unknown("usage: fruit create <name>".to_string())
                    } else {
                        AppCommand::FruitCreate { name }
                    }
                }
                Some("get") => get_or_usage(id_at(2), "fruit", |id| AppCommand::FruitGet { id }),
                Some("list") | None => AppCommand::FruitList,
                Some(other) => unknown_sub("fruit", other),
            },
            "variety" | "varieties" => match sub {
                Some("create") => {
                    let name = parts.get(3..).map(|rest| rest.join(" ")).unwrap_or_default();
                    match id_at(2) {
                        Some(fruit_id) if !name.is_empty() => {
                            AppCommand::VarietyCreate { fruit_id, name }
                        }
                        _ => AppCommand::Unknown(
                            "usage: variety create <fruit_id> <name...>".to_string(),
                        ),
                    }
                }
                Some("get") => {
                    get_or_usage(id_at(2), "variety", |id| AppCommand::VarietyGet { id })
                }
                Some("by-fruit") => match id_at(2) {
                    Some(fruit_id) => AppCommand::VarietiesByFruit { fruit_id },
                    None => AppCommand::Unknown("usage: variety by-fruit <fruit_id>".to_string()),
                },
                Some("list") | None => AppCommand::VarietyList,
                Some(other) => unknown_sub("variety", other),
            },
            "help" | "h" => AppCommand::Help,
            other => AppCommand::Unknown(format!("unknown command: {}", other)),
        }
    }
}

impl FromStr for AppCommand {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        Ok(AppCommand::from_args(&parts))
    }
}

fn get_or_usage<F>(id: Option<i32>, entity: &str, build: F) -> AppCommand
where
    F: FnOnce(i32) -> AppCommand,
{
    match id {
        Some(id) => build(id),
        None => AppCommand::Unknown(format!("usage: {} get <id>", entity)),
    }
}

fn unknown_sub(entity: &str, sub: &str) -> AppCommand {
    AppCommand::Unknown(format!("unknown {} subcommand: {}", entity, sub))
}
