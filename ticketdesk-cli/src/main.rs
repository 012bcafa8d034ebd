use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serenity::all::{ApplicationId, GuildId, Http};

use ticketdesk_core::{channel_name, TicketTopic, UserRef};
use ticketdesk_server::command::ticket_command;
use ticketdesk_server::Config;

/// Ticketdesk: operator tooling for the support-ticket bot
#[derive(Parser, Debug)]
#[command(name = "ticketdesk")]
#[command(about = "Operator tooling for the support-ticket bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load the bot configuration from the environment and print it
    CheckConfig,
    /// Register the `ticket` slash command in the configured guild
    Register(RegisterArgs),
    /// Print the channel name a ticket would get
    ChannelName(ChannelNameArgs),
    /// Decode a ticket channel topic
    DecodeTopic(DecodeTopicArgs),
}

#[derive(Parser, Debug)]
struct RegisterArgs {
    /// If set, print the command definition instead of registering it
    #[arg(long)]
    dry_run: bool,
}

#[derive(Parser, Debug)]
struct ChannelNameArgs {
    /// Owner's user id
    #[arg(long)]
    user_id: u64,

    /// Owner's account name
    #[arg(long)]
    username: String,

    /// Category key (defaults to the default category)
    #[arg(long)]
    category: Option<String>,
}

#[derive(Parser, Debug)]
struct DecodeTopicArgs {
    /// The channel topic, as shown in the channel settings
    topic: String,
}

fn load_config() -> Result<Config> {
    dotenvy::dotenv().ok();
    Config::from_env().context("Failed to load configuration from environment variables")
}

fn check_config() -> Result<()> {
    let config = load_config()?;

    println!("Guild:            {}", config.guild_id);
    println!("Client:           {}", config.client_id);
    println!("Staff role:       {}", config.staff_role);
    match config.fallback_grouping {
        Some(grouping) => println!("Fallback grouping: {}", grouping),
        None => println!("Fallback grouping: (none)"),
    }
    println!("Close delay:      {}s", config.close_delay_secs);
    println!("Delete attempts:  {}", config.delete_retry.attempts);
    println!("HTTP port:        {}", config.port);
    println!(
        "/status:          {}",
        if config.status_auth_token.is_some() { "enabled (token set)" } else { "disabled" }
    );
    println!();
    println!("Categories:");
    for category in config.categories.iter() {
        println!(
            "  {} {:<14} key={:<13} grouping={} staff={}",
            category.emoji, category.label, category.key, category.grouping, category.staff_role
        );
    }
    Ok(())
}

async fn register(args: RegisterArgs) -> Result<()> {
    let config = load_config()?;
    let command = ticket_command(&config.categories);

    if args.dry_run {
        let json = serde_json::to_string_pretty(&command)
            .context("Failed to serialize command definition")?;
        println!("{}", json);
        return Ok(());
    }

    let http = Http::new(&config.discord_token);
    http.set_application_id(ApplicationId::new(config.client_id));

    let registered = GuildId::new(config.guild_id)
        .set_commands(&http, vec![command])
        .await
        .context("Failed to register guild commands")?;

    for command in registered {
        println!("Registered /{} ({})", command.name, command.id);
    }
    Ok(())
}

fn print_channel_name(args: ChannelNameArgs) -> Result<()> {
    let config = load_config()?;
    let category = match args.category.as_deref() {
        Some(key) => config
            .categories
            .get(key)
            .ok_or_else(|| anyhow!("Unknown category '{}'", key))?,
        None => config.categories.default_category(),
    };
    let owner = UserRef::new(args.user_id, args.username.clone(), args.username);
    println!("{}", channel_name(&owner, category));
    println!("{}", TicketTopic::new(&owner, category).encode());
    Ok(())
}

fn decode_topic(args: DecodeTopicArgs) -> Result<()> {
    let topic = TicketTopic::decode(&args.topic).context("Not a ticket topic")?;
    println!("Owner:    {} ({})", topic.owner_tag, topic.owner_id);
    println!("Category: {}", topic.category_label);
    match &topic.category_key {
        Some(key) => println!("Key:      {}", key),
        None => println!("Key:      (legacy topic, matched by label)"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::CheckConfig => check_config(),
        Commands::Register(args) => register(args).await,
        Commands::ChannelName(args) => print_channel_name(args),
        Commands::DecodeTopic(args) => decode_topic(args),
    }
}
