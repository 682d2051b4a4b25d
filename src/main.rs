use std::error::Error;
use std::io::{stdin, stdout};
use std::process::ExitCode;
use std::time::Instant;

use chic_rules::chess_board::INITIAL_POSITION;
use chic_rules::perft::divide;
use chic_rules::ui::run_terminal_game;
use chic_rules::{Game, GameState, Move, RulesEngine};

use clap::arg;
use clap::command;
use clap::ArgMatches;
use clap::Command;

use log::error;

use tabled::settings::Style;
use tabled::Table;
use tabled::Tabled;

fn fen_arg() -> clap::Arg {
    arg!(
    -f --fen <FEN> "Board position"
            )
    .default_value(INITIAL_POSITION)
}

fn main() -> ExitCode {
    let matches = command!()
        .version("v0.1.0")
        .propagate_version(true)
        .arg(arg!(
            -d --debug "Turn debugging information on"
        ))
        .subcommand(Command::new("play").about("Play a game in the terminal").arg(fen_arg()))
        .subcommand(Command::new("moves").about("List the legal moves of a position").arg(fen_arg()))
        .subcommand(
            Command::new("perft")
                .about("Run Perft test")
                .arg(fen_arg())
                .arg(
                    arg!(
                    -x --depth <d> "depth"
                            )
                    .default_value("3")
                    .value_parser(clap::value_parser!(u8).range(1..)),
                )
                .arg(
                    arg!(
                    -m --moves <moves> "List of moves"
                            )
                    .num_args(1..)
                    .value_parser(clap::value_parser!(String)),
                ),
        )
        .get_matches();

    let debug = matches.get_flag("debug");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(if debug { "debug" } else { "info" }))
        .init();

    let result = match matches.subcommand() {
        Some(("play", arg_matches)) => play(fen_of(arg_matches)),
        Some(("moves", arg_matches)) => list_moves(fen_of(arg_matches)),
        Some(("perft", arg_matches)) => {
            let depth = arg_matches.get_one::<u8>("depth").copied().unwrap_or(3);
            let moves = arg_matches
                .get_many::<String>("moves")
                .unwrap_or_default()
                .filter(|&v| !v.is_empty())
                .map(String::as_str)
                .collect::<Vec<_>>();
            perft(fen_of(arg_matches), &moves, depth)
        }
        None => play(INITIAL_POSITION),
        _ => unreachable!("Exhausted list of subcommands"),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn fen_of(arg_matches: &ArgMatches) -> &str {
    arg_matches
        .get_one::<String>("fen")
        .map(String::as_str)
        .unwrap_or(INITIAL_POSITION)
}

fn play(fen: &str) -> Result<(), Box<dyn Error>> {
    let game = Game::from_fen(fen)?;
    let game = run_terminal_game(game, stdin().lock(), stdout())?;
    println!("\n{}", game.status());
    Ok(())
}

#[derive(Tabled)]
struct MoveRow {
    #[tabled(rename = "move")]
    mv: String,
    piece: String,
    capture: String,
    castle: bool,
    en_passant: bool,
    promotion: String,
}

impl From<&Move> for MoveRow {
    fn from(mv: &Move) -> Self {
        MoveRow {
            mv: mv.as_algebraic(),
            piece: mv.moved_piece.to_char().to_string(),
            capture: mv.captured_piece.map(|p| p.to_char().to_string()).unwrap_or_default(),
            castle: mv.is_castle,
            en_passant: mv.is_en_passant,
            promotion: mv.promotion.map(|p| p.to_string()).unwrap_or_default(),
        }
    }
}

fn list_moves(fen: &str) -> Result<(), Box<dyn Error>> {
    let state = GameState::from_fen(fen)?;
    let mut moves = RulesEngine::generate_legal_moves(&state);
    moves.sort_by_key(|m| m.as_algebraic());

    println!("{}", state.render_to_string());
    println!("{}", Table::new(moves.iter().map(MoveRow::from)).with(Style::modern()));
    println!("{} legal moves, {}", moves.len(), RulesEngine::classify_terminal(&state, None));
    Ok(())
}

#[derive(Tabled)]
struct PerftRow {
    depth: u8,
    node_count: u64,
    elapsed_time: f32,
    nodes_per_sec: f32,
}

fn perft(fen: &str, moves: &[&str], depth: u8) -> Result<(), Box<dyn Error>> {
    println!("Perft test for {} moves {:?} with depth {}", fen, moves, depth);
    let mut game = Game::from_fen(fen)?;
    for m in moves {
        game.play_algebraic(m)?;
    }

    let start_time = Instant::now();
    let result_moves = divide(game.state(), depth);
    let elapsed = start_time.elapsed();

    let mut num_nodes = 0;
    for (m, c) in &result_moves {
        println!("{}: {}", m, c);
        num_nodes += c;
    }
    println!("\nNodes searched: {}", num_nodes);

    let row = PerftRow {
        depth,
        node_count: num_nodes,
        elapsed_time: elapsed.as_secs_f32(),
        nodes_per_sec: num_nodes as f32 / elapsed.as_secs_f32().max(f32::EPSILON),
    };
    println!("{}", Table::new([row]).with(Style::modern()));
    Ok(())
}
