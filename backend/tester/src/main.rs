use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use registry::{Board, SchoolListing, SchoolsClient};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(long, env = "SCHOOLS_URL", default_value = "http://localhost:1111")]
    url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Every school, oldest first
    List {
        #[arg(long)]
        search: Option<String>,
    },
    /// One school in full
    Show { id: i32 },
    /// Side by side view of 2 to 4 schools
    Compare { ids: Vec<i32> },
    /// Rate a school, printing the optimistic guess and the server's answer
    Rate { id: i32, stars: u8 },
    Delete { id: i32 },
}

fn print_listing(listing: &SchoolListing) {
    let school = &listing.school;
    let rating = if listing.rating_count > 0 {
        format!("{} ({})", listing.avg_rating, listing.rating_count)
    } else {
        "No ratings".to_string()
    };

    println!(
        "#{:<4} {:<32} {:<16} {:<16} {}",
        school.id, school.name, school.city, school.state, rating
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let client = SchoolsClient::new(args.url);

    match args.command {
        Command::List { search } => {
            let mut board = Board::new(client.list().await?);
            if let Some(term) = search {
                board.set_search(term);
            }

            let shown = board.filtered();
            for listing in &shown {
                print_listing(listing);
            }
            println!("\nShowing {} of {} schools", shown.len(), board.schools().len());
        }
        Command::Show { id } => {
            let school = client.get(id).await?;

            println!("{}", school.name);
            println!("Address: {}", school.address);
            println!("City: {}", school.city);
            println!("State: {}", school.state);
            println!("Contact: {}", school.contact);
            println!("Email: {}", school.email_id);
            println!("Description: {}", school.description.as_deref().unwrap_or("-"));
            if let Some(image) = school.image {
                println!("Image: {image}");
            }
        }
        Command::Compare { ids } => {
            let mut board = Board::new(client.list().await?);
            for id in ids {
                if !board.toggle(id) {
                    println!("Skipping #{id}");
                }
            }

            if !board.can_compare() {
                bail!("Pick at least two existing schools to compare");
            }

            for column in board.comparison() {
                println!("#{} {}", column.id, column.name);
                println!("  Location: {} / {}", column.location[0], column.location[1]);
                println!("  Contact:  {} / {}", column.contact[0], column.contact[1]);
            }
        }
        Command::Rate { id, stars } => {
            let mut board = Board::new(client.list().await?);
            let before = board
                .get(id)
                .map(SchoolListing::summary)
                .with_context(|| format!("No school #{id}"))?;

            let mut guess = board.clone();
            guess.apply_optimistic(id, stars);
            if let Some(listing) = guess.get(id) {
                println!(
                    "Before: {} ({}), optimistic: {} ({})",
                    before.avg_rating, before.rating_count, listing.avg_rating, listing.rating_count
                );
            }

            let summary = client.rate_optimistic(&mut board, id, stars).await?;
            println!("Server: {} ({})", summary.avg_rating, summary.rating_count);
        }
        Command::Delete { id } => {
            client.delete(id).await?;
            println!("Deleted #{id}");
        }
    }

    Ok(())
}
