//! Kalakar CLI - run the studio's AI flows from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Product copy and pricing
//! kalakar describe -p "Kolhapuri Chappals" -c "Hand-stitched leather" \
//!     -s "Worn since the 13th century" -a "Young professionals"
//! kalakar price -p "Ganjifa Cards" -d "Hand-painted playing cards" -c "Art"
//!
//! # Sales insights (calls the units-sold tool)
//! kalakar insights -p "Handwoven Pashmina Shawl" -a artisan-7 \
//!     --current-price 6500 --average-order-value 7000 \
//!     --regional-demand "Strong in the north" --new-item-volume 10
//!
//! # Dashboard strings to Hindi
//! kalakar translate Orders Dashboard
//!
//! # Sample order book
//! kalakar orders --product "Ganjifa Cards"
//! ```
//!
//! # Environment Variables
//!
//! - `GEMINI_API_KEY` - required by every flow subcommand
//! - `GEMINI_MODEL`, `GEMINI_BASE_URL` - optional overrides

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use kalakar_studio::flows::{
    DiscoverTrendingCraftsInput, GenerateProductDescriptionInput, GetAiPlatformTourInput,
    GetMarketingIdeasInput, SuggestProductPriceInput,
};

mod commands;

#[derive(Parser)]
#[command(name = "kalakar")]
#[command(author, version, about = "Kalakar Studio AI flows from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a product description
    Describe {
        #[arg(short, long)]
        product_name: String,

        /// How the product is made
        #[arg(short, long)]
        craftsmanship_details: String,

        /// Cultural background of the craft
        #[arg(short = 's', long)]
        cultural_significance: String,

        #[arg(short = 'a', long)]
        target_audience: String,
    },
    /// Suggest a price in INR
    Price {
        #[arg(short, long)]
        product_name: String,

        #[arg(short, long)]
        description: String,

        #[arg(short, long)]
        category: String,
    },
    /// Marketing ideas for an event
    Marketing {
        #[arg(short, long)]
        event_details: String,

        /// Products the artisan sells
        #[arg(short = 'p', long)]
        artisan_products: String,
    },
    /// Sales insights for a product, with inventory imbalance
    Insights {
        #[arg(short, long)]
        product_name: String,

        #[arg(short, long)]
        artisan_id: String,

        #[arg(long)]
        current_price: f64,

        #[arg(long)]
        average_order_value: f64,

        #[arg(long)]
        regional_demand: String,

        /// Items made in the period
        #[arg(long)]
        new_item_volume: u64,
    },
    /// Discover trending crafts
    Trends {
        #[arg(long)]
        recent_sales_data: String,

        #[arg(long)]
        consumer_feedback: String,

        #[arg(long)]
        demographic_data: String,
    },
    /// Personalized platform tour
    Tour {
        #[arg(short, long)]
        user_behavior: String,

        #[arg(short, long)]
        support_need: String,
    },
    /// Translate UI strings to Hindi
    Translate {
        /// Texts to translate
        texts: Vec<String>,
    },
    /// List sample orders
    Orders {
        /// Only orders for this product
        #[arg(short, long)]
        product: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kalakar_studio=warn,kalakar=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Describe {
            product_name,
            craftsmanship_details,
            cultural_significance,
            target_audience,
        } => {
            commands::flows::describe(GenerateProductDescriptionInput {
                product_name,
                craftsmanship_details,
                cultural_significance,
                target_audience,
            })
            .await
        }
        Commands::Price {
            product_name,
            description,
            category,
        } => {
            commands::flows::price(SuggestProductPriceInput {
                product_name,
                description,
                category,
            })
            .await
        }
        Commands::Marketing {
            event_details,
            artisan_products,
        } => {
            commands::flows::marketing(GetMarketingIdeasInput {
                event_details,
                artisan_products,
            })
            .await
        }
        Commands::Insights {
            product_name,
            artisan_id,
            current_price,
            average_order_value,
            regional_demand,
            new_item_volume,
        } => {
            commands::flows::insights(
                product_name,
                &artisan_id,
                current_price,
                average_order_value,
                regional_demand,
                new_item_volume,
            )
            .await
        }
        Commands::Trends {
            recent_sales_data,
            consumer_feedback,
            demographic_data,
        } => {
            commands::flows::trends(DiscoverTrendingCraftsInput {
                recent_sales_data,
                consumer_feedback,
                demographic_data,
            })
            .await
        }
        Commands::Tour {
            user_behavior,
            support_need,
        } => {
            commands::flows::tour(GetAiPlatformTourInput {
                user_behavior,
                support_need,
            })
            .await
        }
        Commands::Translate { texts } => commands::flows::translate(texts).await,
        Commands::Orders { product } => commands::orders::list(product.as_deref()).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_translate_texts() {
        let cli = Cli::try_parse_from(["kalakar", "translate", "Orders", "Orders", "Dashboard"])
            .expect("parse");
        match cli.command {
            Commands::Translate { texts } => assert_eq!(texts, ["Orders", "Orders", "Dashboard"]),
            _ => panic!("expected translate"),
        }
    }

    #[test]
    fn test_parse_insights_numbers() {
        let cli = Cli::try_parse_from([
            "kalakar",
            "insights",
            "-p",
            "Ganjifa Cards",
            "-a",
            "artisan-7",
            "--current-price",
            "1200.5",
            "--average-order-value",
            "1500",
            "--regional-demand",
            "Steady",
            "--new-item-volume",
            "50",
        ])
        .expect("parse");
        match cli.command {
            Commands::Insights {
                current_price,
                new_item_volume,
                ..
            } => {
                assert!((current_price - 1200.5).abs() < f64::EPSILON);
                assert_eq!(new_item_volume, 50);
            }
            _ => panic!("expected insights"),
        }
    }

    #[test]
    fn test_insights_rejects_non_numeric_volume() {
        let result = Cli::try_parse_from([
            "kalakar",
            "insights",
            "-p",
            "x",
            "-a",
            "y",
            "--current-price",
            "1",
            "--average-order-value",
            "1",
            "--regional-demand",
            "z",
            "--new-item-volume",
            "many",
        ]);
        assert!(result.is_err());
    }
}
