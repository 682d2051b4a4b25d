use std::io::{self, BufRead, Write};

use log::info;

use crate::error::RulesError;
use crate::game::Game;

const HELP: &str = "commands: <move> (e.g. e2e4, e7e8q), moves, undo, fen, board, help, quit";

/// Runs an interactive game over a line based text stream until `quit` or end of input.
/// Returns the game as it stands when the loop ends.
pub fn run_terminal_game<R: BufRead, W: Write>(mut game: Game, input: R, mut output: W) -> io::Result<Game> {
    writeln!(output, "{}", game.state().render_to_string())?;
    writeln!(output, "{}", HELP)?;
    prompt(&game, &mut output)?;

    for line in input.lines() {
        let line = line?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(command) = tokens.first() else {
            prompt(&game, &mut output)?;
            continue;
        };

        match *command {
            "quit" | "exit" => break,
            "help" => writeln!(output, "{}", HELP)?,
            "fen" => writeln!(output, "{}", game.state().to_fen())?,
            "board" => writeln!(output, "{}", game.state().render_to_string())?,
            "moves" => {
                let mut moves: Vec<String> = game.legal_moves().iter().map(|m| m.as_algebraic()).collect();
                moves.sort();
                writeln!(output, "{}", moves.join(" "))?;
            }
            "undo" => match game.undo() {
                Some(mv) => {
                    writeln!(output, "took back {}", mv)?;
                    writeln!(output, "{}", game.state().render_to_string())?;
                }
                None => writeln!(output, "nothing to undo")?,
            },
            text => match game.play_algebraic(text) {
                Ok(mv) => {
                    info!("played {}", mv);
                    writeln!(output, "{}", game.state().render_to_string())?;
                    let status = game.status();
                    if status.is_over() {
                        info!("{} after {}", status, mv);
                        writeln!(output, "{}", status)?;
                    }
                }
                Err(RulesError::PromotionRequired(field)) => {
                    writeln!(output, "pawn reaches {}: append q, r, b or n to the move", field)?
                }
                Err(e) => writeln!(output, "{}", e)?,
            },
        }
        prompt(&game, &mut output)?;
    }

    Ok(game)
}

fn prompt<W: Write>(game: &Game, output: &mut W) -> io::Result<()> {
    let state = game.state();
    let check = if state.is_king_attacked(state.active_color()) { " (check)" } else { "" };
    write!(output, "{} to move{}> ", state.active_color(), check)?;
    output.flush()
}
