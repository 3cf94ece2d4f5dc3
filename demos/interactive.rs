use cmdargs::arguments::{
    starts_with_ignore_case, FirstOf, IdSource, Integer, Literal, ObjectById, ObjectId, Text,
};
use cmdargs::error::ArgumentError;
use cmdargs::{ArgumentExt, Command, CommandContext, CommandInput, ContextView};
use rustyline::completion::Completer;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct Shop {
    id: u32,
    name: &'static str,
    owner: &'static str,
}

const SHOPS: [Shop; 4] = [
    Shop {
        id: 1,
        name: "bakery",
        owner: "alice",
    },
    Shop {
        id: 2,
        name: "forge",
        owner: "bob",
    },
    Shop {
        id: 12,
        name: "market",
        owner: "alice",
    },
    Shop {
        id: 21,
        name: "tavern",
        owner: "carol",
    },
];

const PLAYERS: [&str; 3] = ["alice", "bob", "carol"];

struct Player {
    name: &'static str,
    target: Option<u32>,
}

struct ShopIds;

impl IdSource<Player, u32> for ShopIds {
    fn suggestions(&self, _: &CommandInput<Player>, _: ContextView<'_>, prefix: &str) -> Vec<u32> {
        SHOPS
            .iter()
            .map(|shop| shop.id)
            .filter(|id| id.to_string().starts_with(prefix))
            .collect()
    }

    fn pinned_suggestions(
        &self,
        input: &CommandInput<Player>,
        _: ContextView<'_>,
        prefix: &str,
    ) -> Vec<u32> {
        input
            .invoker()
            .target
            .filter(|id| id.to_string().starts_with(prefix))
            .into_iter()
            .collect()
    }

    fn id_to_string(&self, id: &u32) -> String {
        id.to_string()
    }
}

struct ShopNames;

impl IdSource<Player, String> for ShopNames {
    fn suggestions(
        &self,
        _: &CommandInput<Player>,
        _: ContextView<'_>,
        prefix: &str,
    ) -> Vec<String> {
        SHOPS
            .iter()
            .filter(|shop| starts_with_ignore_case(shop.name, prefix))
            .map(|shop| shop.name.to_string())
            .collect()
    }

    fn id_to_string(&self, id: &String) -> String {
        id.clone()
    }
}

fn shop_by_id(
    _: &CommandInput<Player>,
    _: ContextView<'_>,
    id: &u32,
) -> Result<Option<Shop>, ArgumentError> {
    Ok(SHOPS.iter().find(|shop| shop.id == *id).cloned())
}

fn shop_by_name(
    _: &CommandInput<Player>,
    _: ContextView<'_>,
    name: &String,
) -> Result<Option<Shop>, ArgumentError> {
    Ok(SHOPS
        .iter()
        .find(|shop| shop.name.eq_ignore_ascii_case(name))
        .cloned())
}

fn targeted_shop(input: &CommandInput<Player>, _: ContextView<'_>) -> Result<Shop, ArgumentError> {
    input
        .invoker()
        .target
        .and_then(|id| SHOPS.iter().find(|shop| shop.id == id).cloned())
        .ok_or_else(|| ArgumentError::requires_invoker("shop", "player looking at a shop"))
}

fn known_player(name: String) -> Result<String, ArgumentError> {
    if PLAYERS.iter().any(|player| player.eq_ignore_ascii_case(&name)) {
        Ok(name.to_lowercase())
    } else {
        Err(ArgumentError::invalid("player", name, Some("unknown player".into())))
    }
}

fn define_commands() -> Result<Vec<(&'static str, Command<Player>)>, Box<dyn std::error::Error>> {
    let shop = FirstOf::new(
        "shop",
        vec![
            ObjectById::new(
                "shop",
                ObjectId::new("shop", Integer::<u32>::new("shop-id"), ShopIds),
                shop_by_id,
            )
            .boxed(),
            ObjectById::new(
                "shop",
                ObjectId::new("shop", Text::new("shop-name"), ShopNames)
                    .with_minimum_completion_input(1),
                shop_by_name,
            )
            .boxed(),
        ],
    )?
    .without_joined_format()
    .or_targeted(targeted_shop);

    let remove = Command::new(vec![
        Literal::new("remove").erased(),
        shop.erased(),
        Integer::<u32>::new("amount").erased(),
    ])?;

    let list = Command::new(vec![
        Literal::new("list").erased(),
        Text::new("player")
            .map(known_player)
            .or_invoker("player", |player: &Player| Some(player.name.to_string()))
            .erased(),
        Integer::<u32>::new("page").or_default(1).erased(),
    ])?;

    let teleport = Command::new(vec![
        Literal::new("tp").erased(),
        Integer::<i32>::new("x").erased(),
        Integer::<i32>::new("y").erased(),
    ])?;

    Ok(vec![("remove", remove), ("list", list), ("tp", teleport)])
}

struct Shell {
    commands: Vec<(&'static str, Command<Player>)>,
    input: CommandInput<Player>,
}

impl Shell {
    fn find(&self, line: &str) -> Option<&Command<Player>> {
        let label = line.split_whitespace().next()?;
        self.commands
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(label))
            .map(|(_, command)| command)
    }

    fn run(&self, line: &str) {
        if line.trim() == "help" {
            for (_, command) in &self.commands {
                println!("   {}", command.usage());
            }
            return;
        }
        let command = match self.find(line) {
            Some(command) => command,
            None => {
                println!("Error: unknown command, try \"help\"");
                return;
            }
        };
        match command.parse_line(&self.input, line) {
            Ok(context) => println!("<< {}", describe(&context)),
            Err(error) => println!("Error: {}", error),
        }
    }

    fn complete(&self, line: &str) -> Vec<String> {
        let mut suggestions = Vec::new();
        for (_, command) in &self.commands {
            for suggestion in command.complete_line(&self.input, line) {
                if !suggestions.contains(&suggestion) {
                    suggestions.push(suggestion);
                }
            }
        }
        suggestions.truncate(self.input.max_suggestions());
        suggestions
    }
}

fn describe(context: &CommandContext) -> String {
    context
        .names()
        .map(|name| {
            let value = if let Some(shop) = context.get::<Shop>(name) {
                format!("{} #{} owned by {}", shop.name, shop.id, shop.owner)
            } else if let Some(text) = context.get::<String>(name) {
                text.clone()
            } else if let Some(number) = context.get::<u32>(name) {
                number.to_string()
            } else if let Some(number) = context.get::<i32>(name) {
                number.to_string()
            } else {
                "?".to_string()
            };
            format!("{} = {}", name, value)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

struct ShellHelper(Rc<Shell>);

impl Completer for ShellHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        let line = &line[..pos];
        let start = line.rfind(' ').map(|index| index + 1).unwrap_or(0);
        Ok((start, self.0.complete(line)))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;
}

impl Highlighter for ShellHelper {}

impl Validator for ShellHelper {}

impl Helper for ShellHelper {}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let shell = Rc::new(Shell {
        commands: define_commands()?,
        input: CommandInput::new(Player {
            name: "alice",
            target: Some(12),
        })
        .with_max_suggestions(10),
    });

    let mut rl = Editor::<ShellHelper>::new();
    rl.set_helper(Some(ShellHelper(Rc::clone(&shell))));
    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                rl.add_history_entry(line.as_str());
                shell.run(&line);
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {}", err);
                break;
            }
        }
    }
    Ok(())
}
