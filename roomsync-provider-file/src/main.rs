//! roomsync-provider-file - serves room calendars from a directory of JSON files
//!
//! This binary implements the roomsync provider protocol, communicating
//! with roomsync via JSON over stdin/stdout.
//!
//! Each resource is one file, `{root}/{resource}.json`, holding an array of
//! appointments. Useful for demos, tests, and feeding roomsync from an export.

mod calendar_files;

use std::io::{self, BufRead, Write};

use calendar_files::CalendarFiles;
use roomsync_core::remote::protocol::{
    CancelAppointment, Command, ListAppointments, ListResources, Request, Response,
};
use serde::de::DeserializeOwned;

fn main() {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Failed to read stdin: {}", e);
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => handle_request(request),
            Err(e) => Response::error(&format!("Failed to parse request: {}", e)),
        };

        if writeln!(stdout, "{}", response)
            .and_then(|_| stdout.flush())
            .is_err()
        {
            break;
        }
    }
}

fn handle_request(request: Request) -> String {
    match request.command {
        Command::ListResources => handle_list_resources(request.params),
        Command::ListAppointments => handle_list_appointments(request.params),
        Command::CancelAppointment => handle_cancel_appointment(request.params),
    }
}

fn parse_params<P: DeserializeOwned>(params: serde_json::Value) -> Result<P, String> {
    serde_json::from_value(params).map_err(|e| Response::error(&format!("Invalid params: {}", e)))
}

fn handle_list_resources(params: serde_json::Value) -> String {
    let params: ListResources = match parse_params(params) {
        Ok(p) => p,
        Err(response) => return response,
    };

    match CalendarFiles::from_config(&params.provider_config).and_then(|f| f.resources()) {
        Ok(resources) => Response::success(resources),
        Err(e) => Response::error(&format!("{:#}", e)),
    }
}

fn handle_list_appointments(params: serde_json::Value) -> String {
    let params: ListAppointments = match parse_params(params) {
        Ok(p) => p,
        Err(response) => return response,
    };

    let today = chrono::Local::now().date_naive();
    match CalendarFiles::from_config(&params.provider_config)
        .and_then(|f| f.appointments(&params.resource, today, params.window_months))
    {
        Ok(appointments) => Response::success(appointments),
        Err(e) => Response::error(&format!("{:#}", e)),
    }
}

fn handle_cancel_appointment(params: serde_json::Value) -> String {
    let params: CancelAppointment = match parse_params(params) {
        Ok(p) => p,
        Err(response) => return response,
    };

    match CalendarFiles::from_config(&params.provider_config)
        .and_then(|f| f.cancel(&params.appointment_id, &params.reason))
    {
        Ok(()) => Response::success(()),
        Err(e) => Response::error(&format!("{:#}", e)),
    }
}
