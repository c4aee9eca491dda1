use std::{env::args_os, io};

use ese_dataset::{ese::EseContent, navaid::Navaids, options::EseOptions};

fn main() {
    tracing_subscriber::fmt().with_writer(io::stderr).init();
    let ese_path = args_os().nth(1).expect("missing argument: path to .ese");
    let navaids_path = args_os()
        .nth(2)
        .expect("missing argument: path to navaids .json");
    let options = args_os().nth(3).map_or_else(EseOptions::default, |path| {
        EseOptions::from_path(path).expect("unsuccessful options parse")
    });

    let navaids = Navaids::from_path(navaids_path).expect("unsuccessful navaids parse");
    let ese = EseContent::from_path(ese_path, &navaids, &options).expect("unsuccessful parse");

    println!("{}", serde_json::to_string(&ese).unwrap());
}
