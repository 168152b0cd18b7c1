extern crate clap;
extern crate fmp4_box;
#[macro_use]
extern crate trackable;

use std::io::{stdin, Read};

use clap::{App, Arg};
use fmp4_box::bx::Box;
use fmp4_box::{Error, ErrorKind, Result};

macro_rules! track_io {
    ($expr:expr) => {
        $expr.map_err(|e: std::io::Error| {
            use trackable::error::ErrorKindExt;
            track!(Error::from(ErrorKind::Other.cause(e)))
        })
    };
}

fn main() {
    let matches = App::new("parse")
        .arg(
            Arg::with_name("TYPE")
                .long("type")
                .takes_value(true)
                .possible_values(&["tree", "tracks"])
                .default_value("tree"),
        )
        .get_matches();
    match matches.value_of("TYPE").unwrap() {
        "tree" => track_try_unwrap!(parse_tree()),
        "tracks" => track_try_unwrap!(parse_tracks()),
        _ => unreachable!(),
    }
}

fn read_stdin() -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    track_io!(stdin().read_to_end(&mut buf))?;
    Ok(buf)
}

fn parse_tree() -> Result<()> {
    let buf = track!(read_stdin())?;
    let (tree, tracks) = track!(Box::parse(&buf))?;
    println!("{}", tree);
    for track in tracks {
        println!("{:?}", track);
    }
    Ok(())
}

fn parse_tracks() -> Result<()> {
    let buf = track!(read_stdin())?;
    let tracks = track!(fmp4_box::fmp4::discover_tracks(&buf))?;
    for track in tracks {
        println!("{:?}", track);
    }
    Ok(())
}
