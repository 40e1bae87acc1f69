//! A simple CLI tool for independently verifying an election.
//! It replays the event log of a dump through the same election rules the server
//! enforces, and is by definition compatible with the output of our API endpoints.

use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::BufReader;

use clap::{Arg, ArgAction, ArgMatches, Command};
use rocket::serde::json::serde_json;

use election_backend::model::{
    common::CandidateId,
    election::{ElectionDump, ElectionError, VerificationError},
};

const PROGRAM_NAME: &str = "verify-election";

const ABOUT_TEXT: &str = "Verify the integrity of an election by replaying its event log.

EXIT CODES:
     0: Verification succeeded.
   255: Ran successfully, but verification failed.
 Other: Error.";

const DUMP_PATH: &str = "DUMP_PATH";

const DUMP_PATH_HELP: &str = "The path to a JSON dump of the election,\n\
as returned by `GET /election/dump`";

/// Construct the CLI configuration.
fn cli() -> Command {
    // Make the build dirty when the toml changes.
    include_str!("../Cargo.toml");

    clap::command!(PROGRAM_NAME).about(ABOUT_TEXT).arg(
        Arg::new(DUMP_PATH)
            .help(DUMP_PATH_HELP)
            .action(ArgAction::Set)
            .required(true),
    )
}

/// Errors that this program may produce.
#[derive(Debug, Eq, PartialEq)]
enum Error {
    /// IO error described by the inner message.
    IO(String),
    /// Failed to decode the JSON dump.
    Format(String),
    /// Verification failed due to the contained reason.
    Verification(VerificationError),
}

/// One candidate's standing, as shown to the user.
#[derive(Debug, Eq, PartialEq)]
struct Tally {
    pub candidate_id: CandidateId,
    pub name: String,
    pub party: String,
    pub votes: u64,
    pub is_active: bool,
}

impl Display for Tally {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} {} ({}): {} vote{}{}",
            self.candidate_id,
            self.name,
            self.party,
            self.votes,
            if self.votes != 1 { "s" } else { "" },
            if self.is_active { "" } else { " [withdrawn]" }
        )
    }
}

/// What a successfully verified dump shows.
#[derive(Debug, Eq, PartialEq)]
struct Summary {
    /// Most votes first, ties in id order.
    pub tallies: Vec<Tally>,
    /// `None` until results are declared, `Some(None)` if declared with no winner.
    pub winner: Option<Option<CandidateId>>,
    pub total_votes: u64,
}

/// Run verification.
fn verify(path: &str) -> Result<Summary, Error> {
    // Load the file.
    let file = BufReader::new(File::open(path).map_err(|e| Error::IO(e.to_string()))?);
    let dump: ElectionDump =
        serde_json::from_reader(file).map_err(|e| Error::Format(e.to_string()))?;

    // Run verification.
    let election = dump.verify().map_err(Error::Verification)?;

    let mut tallies = election
        .candidates()
        .iter()
        .map(|candidate| Tally {
            candidate_id: candidate.id,
            name: candidate.name.clone(),
            party: candidate.party.clone(),
            votes: candidate.vote_count,
            is_active: candidate.is_active,
        })
        .collect::<Vec<_>>();
    tallies.sort_by(|a, b| {
        b.votes
            .cmp(&a.votes)
            .then(a.candidate_id.cmp(&b.candidate_id))
    });

    let winner = election
        .results_published()
        .then(|| election.winning_candidate_id());

    Ok(Summary {
        tallies,
        winner,
        total_votes: election.total_votes_cast(),
    })
}

fn describe_rejection(error: &ElectionError) -> String {
    match error {
        ElectionError::AlreadyVoted(voter) => format!("{voter} voted more than once"),
        ElectionError::Unauthorized(reason) => format!("the caller had no right to do this ({reason})"),
        ElectionError::WrongPhase { current, .. } => {
            format!("it happened during the {current} phase")
        }
        other => other.to_string(),
    }
}

fn run(args: &ArgMatches) -> u8 {
    // Unwrap safe as the argument is required.
    let path = args.get_one::<String>(DUMP_PATH).unwrap();
    match verify(path) {
        Ok(summary) => {
            println!("Verification succeeded.");
            for tally in &summary.tallies {
                println!("{tally}");
            }
            println!("Total votes: {}", summary.total_votes);
            match summary.winner {
                Some(Some(id)) => {
                    // Unwrap safe as the winner is always a candidate.
                    let winner = summary
                        .tallies
                        .iter()
                        .find(|tally| tally.candidate_id == id)
                        .unwrap();
                    println!("Winner: {} ({})", winner.name, winner.party);
                }
                Some(None) => println!("No winner: no votes were cast."),
                None => println!("Results have not been declared yet."),
            }
            0
        }
        Err(Error::IO(msg)) => {
            println!("Failed to read file: {}", msg);
            1
        }
        Err(Error::Format(msg)) => {
            println!("Invalid JSON: {}", msg);
            1
        }
        Err(Error::Verification(err)) => {
            let msg = match &err {
                VerificationError::Rejected { sequence, error } => format!(
                    "Event {} could not have happened: {}.",
                    sequence,
                    describe_rejection(error)
                ),
                VerificationError::Mismatch { sequence } => format!(
                    "Event {} differs from what the election rules produce.",
                    sequence
                ),
                VerificationError::Claim(what) => format!(
                    "The dump's {} do not match its own event log.",
                    what
                ),
                other => format!("The event log is malformed: {}.", other),
            };
            println!("Verification failed: {}", msg);
            255
        }
    }
}

fn main() {
    let args = cli().get_matches();
    let exit_code = run(&args);
    std::process::exit(exit_code.into())
}
