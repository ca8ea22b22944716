use crate::{preview, print_sources, DynAssistant};
use nobel_rag_core::Answer;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

const HISTORY_PREVIEW_CHARS: usize = 120;

#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Question(&'a str),
    History,
    Clear,
    Sources,
    Quit,
    Blank,
    Unknown(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    match line {
        "" => Input::Blank,
        "/history" => Input::History,
        "/clear" => Input::Clear,
        "/sources" => Input::Sources,
        "/quit" | "/exit" => Input::Quit,
        command if command.starts_with('/') => Input::Unknown(command),
        question => Input::Question(question),
    }
}

/// Exchanges are only ever appended; `/clear` drops them all at once.
#[derive(Default)]
struct Conversation {
    exchanges: Vec<Answer>,
}

impl Conversation {
    fn push(&mut self, answer: Answer) {
        self.exchanges.push(answer);
    }

    fn last(&self) -> Option<&Answer> {
        self.exchanges.last()
    }

    fn clear(&mut self) {
        self.exchanges.clear();
    }

    fn render(&self) -> Vec<String> {
        self.exchanges
            .iter()
            .enumerate()
            .map(|(position, exchange)| {
                format!(
                    "{}. [{}] {}\n   {}",
                    position + 1,
                    exchange.intent,
                    exchange.query,
                    preview(&exchange.answer, HISTORY_PREVIEW_CHARS)
                )
            })
            .collect()
    }
}

fn prompt() -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    write!(stdout, "\n> ")?;
    stdout.flush()
}

pub async fn run(assistant: &DynAssistant, show_sources: bool) -> anyhow::Result<()> {
    println!("Ask about Nobel Prize laureates. Commands: /history /clear /sources /quit");

    let mut show_sources = show_sources;
    let mut conversation = Conversation::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    prompt()?;
    while let Some(line) = lines.next_line().await? {
        match parse_input(&line) {
            Input::Blank => {}
            Input::Quit => break,
            Input::History => {
                let rendered = conversation.render();
                if rendered.is_empty() {
                    println!("No questions asked yet.");
                }
                for entry in rendered {
                    println!("{entry}");
                }
            }
            Input::Clear => {
                conversation.clear();
                println!("History cleared.");
            }
            Input::Sources => {
                show_sources = !show_sources;
                println!("Sources {}.", if show_sources { "on" } else { "off" });
                if show_sources {
                    if let Some(answer) = conversation.last() {
                        print_sources(&answer.sources);
                    }
                }
            }
            Input::Unknown(command) => println!("Unknown command {command}"),
            Input::Question(question) => {
                let answer = assistant.ask_with_sources(question).await;
                println!("{}", answer.answer);
                if show_sources {
                    print_sources(&answer.sources);
                }
                conversation.push(answer);
            }
        }
        prompt()?;
    }

    println!();
    Ok(())
}
