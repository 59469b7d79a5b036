//! Shared dataset fixtures for integration tests.

#![allow(dead_code)]

use grid_schema::config::EditorConfig;
use grid_schema::schema::Record;
use grid_schema::store::{DataStore, DatasetKind};
use serde_json::{Value, json};

/// Two companies; the second is out of service. Plants carry `Pmax` and
/// differ in which optional fields they have.
pub fn generator_tree() -> Value {
    json!({
        "Empresas_G1": [
            {
                "Name": "Andes Energia", "Code": "AE", "Estado": true, "Rut": "76.001",
                "Complejos_G2": [
                    {
                        "Name": "Maipo", "Code": "MP",
                        "Centrales_G3": [
                            {
                                "Name": "Alfalfal", "Code": "ALF", "Pmax": 178.0,
                                "Tecnologia": "hydro", "Comuna": "San Jose",
                                "Grupos_G4": [
                                    {"Name": "G1", "Code": "ALF-G1", "Unidades_G5": [
                                        {"Name": "U1", "Code": "ALF-U1", "Pnom": 89.0},
                                        {
                                            "Name": "U2", "Code": "ALF-U2", "Pnom": 89.0,
                                            "Estado": false
                                        }
                                    ]}
                                ]
                            },
                            {
                                "Name": "Queltehues", "Code": "QUE", "Pmax": 49.0,
                                "Tecnologia": null
                            }
                        ]
                    }
                ]
            },
            {
                "Name": "Costa Solar", "Code": "CS", "Estado": false,
                "Complejos_G2": [
                    {
                        "Name": "Atacama", "Code": "AT",
                        "Centrales_G3": [
                            {"Name": "Sol Norte", "Code": "SN", "Pmax": 100, "Tecnologia": "solar"}
                        ]
                    }
                ]
            }
        ]
    })
}

/// A small network model with a bus map, a partly inactive generator map,
/// and branches that disagree on optional ratings.
pub fn network_base() -> Value {
    json!({
        "base": {
            "name": "case4",
            "baseMVA": 100,
            "per_unit": true,
            "bus": {
                "1": {"name": "North", "index": 1, "bus_i": 1, "vm": 1.0, "zone": 1},
                "2": {"name": "South", "index": 2, "bus_i": 2, "vm": 0.98},
                "3": {"name": "East", "index": 3, "bus_i": 3, "vm": 1.01, "zone": null}
            },
            "gen": {
                "1": {
                    "name": "G1", "index": 1, "gen_bus": 1, "gen_status": 1, "pmax": 150, "pmin": 0
                },
                "2": {"name": "G2", "index": 2, "gen_bus": 3, "gen_status": 0, "pmax": 80}
            },
            "branch": {
                "1": {
                    "name": "L12", "index": 1, "f_bus": 1, "t_bus": 2, "br_status": 1,
                    "rate_a": 250, "tags": ["ac"]
                },
                "2": {"name": "L23", "index": 2, "f_bus": 2, "t_bus": 3, "br_status": 1},
                "3": {
                    "name": "L13", "index": 3, "f_bus": 1, "t_bus": 3, "br_status": "0",
                    "rate_a": 90, "angmin": -0.5
                }
            },
            "load": {
                "1": {"name": "D1", "index": 1, "load_bus": 2, "status": 1, "pd": 90, "qd": 30}
            },
            "shunt": {}
        }
    })
}

/// Loads with mixed status encodings and partial power fields.
pub fn demand_base() -> Value {
    json!({
        "base": {
            "load": {
                "1": {
                    "name": "Santiago", "index": 1, "load_bus": 10, "status": 1, "pd": 120.0,
                    "qd": 40.0
                },
                "2": {"name": "Valparaiso", "index": 2, "load_bus": 11, "status": true, "pd": 60.0},
                "3": {
                    "name": "Rancagua", "index": 3, "load_bus": 12, "status": 0, "pd": 45.5,
                    "qd": 10.0, "profile": "industrial"
                },
                "4": {"name": "Talca", "index": 4, "load_bus": 13, "status": "1", "pd": 20.0}
            }
        }
    })
}

/// A store with the standard layout and every fixture loaded.
pub fn loaded_store() -> DataStore {
    let mut store = DataStore::new(EditorConfig::standard());
    store.load(DatasetKind::Generators, generator_tree());
    store.load(DatasetKind::Network, network_base());
    store.load(DatasetKind::Demand, demand_base());
    store
}

/// Converts JSON objects into records, skipping anything else.
pub fn records(values: Vec<Value>) -> Vec<Record> {
    values
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .collect()
}
