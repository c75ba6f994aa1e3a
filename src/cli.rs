use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use bigdecimal::BigDecimal;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use remit_core::chain::settlement::SettlementOutcome;
use remit_core::config::Config;
use remit_core::domain::{Channel, Currency, Direction, TransactionDraft, TransactionStatus};
use remit_core::gateway::events::PushChannel;
use remit_core::instructions;
use remit_core::session::Session;
use remit_core::validation;
use remit_core::AppContext;

#[derive(Parser)]
#[command(name = "remit")]
#[command(about = "Remita - fiat/stablecoin transfer client", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the current user profile
    Me,

    /// List transactions with their current status
    Transactions,

    /// Submit a new transfer
    Submit {
        /// FIAT_TO_CHAIN or CHAIN_TO_FIAT
        #[arg(long)]
        direction: Direction,

        #[arg(long)]
        amount: BigDecimal,

        /// euro, usd, cdf or usdc
        #[arg(long)]
        currency: Currency,

        /// Deposit channel (BANK_WIRE, MOBILE_MONEY, CASH, CRYPTO)
        #[arg(long)]
        funds_in: Channel,

        /// Receive channel (BANK_WIRE, MOBILE_MONEY, CASH, CRYPTO)
        #[arg(long)]
        funds_out: Channel,

        /// Hold the transfer in escrow
        #[arg(long)]
        escrow: bool,
    },

    /// Confirm a created transfer
    Confirm {
        /// Transaction UUID
        #[arg(value_name = "TX_ID")]
        tx_id: Uuid,
    },

    /// Cancel a created transfer
    Cancel {
        /// Transaction UUID
        #[arg(value_name = "TX_ID")]
        tx_id: Uuid,
    },

    /// Report an observed deposit for a processing transfer
    Deposit {
        /// Transaction UUID
        #[arg(value_name = "TX_ID")]
        tx_id: Uuid,

        /// Credit the settlement asset on-chain first (CRYPTO deposits)
        #[arg(long)]
        mint: bool,
    },

    /// Run the on-chain settlement for a deposited transfer
    Settle {
        /// Transaction UUID
        #[arg(value_name = "TX_ID")]
        tx_id: Uuid,
    },

    /// Start identity verification
    Onboard {
        /// Phone number shared with the verification provider
        #[arg(long)]
        phone: String,
    },

    /// Register a self-custody wallet address
    RegisterWallet {
        /// EVM address (0x...)
        #[arg(value_name = "ADDRESS")]
        address: String,
    },

    /// Watch the store, reconciling from poll and push (default)
    Watch,

    /// Validate the configuration
    Config,
}

pub async fn run(cli: Cli, config: Config, session: Session) -> Result<()> {
    let ctx = AppContext::new(&config, session.clone());

    match cli.command.unwrap_or(Commands::Watch) {
        Commands::Me => {
            ctx.reconciler.refresh().await?;
            match ctx.store.user() {
                Some(user) => {
                    println!("{}", serde_json::to_string_pretty(user.as_ref())?);
                    println!("{}", user.onboarding_step().label());
                }
                None => println!("Vous n'avez pas encore de compte"),
            }
        }

        Commands::Transactions => {
            ctx.reconciler.refresh().await?;
            let txs = ctx.store.transactions();
            if txs.is_empty() {
                println!("Aucune transaction.");
            }
            for tx in txs {
                println!(
                    "{}  {}  {}{}  [{}]  {}",
                    tx.id,
                    tx.created_at.format("%Y-%m-%d %H:%M"),
                    tx.amount,
                    tx.currency.symbol(),
                    tx.status.label(),
                    tx.reference.unwrap_or_default(),
                );
            }
        }

        Commands::Submit {
            direction,
            amount,
            currency,
            funds_in,
            funds_out,
            escrow,
        } => {
            let draft = TransactionDraft {
                direction,
                amount,
                currency,
                funds_in,
                funds_out,
                escrow,
            };
            let id = ctx.controller.submit(&draft).await?;
            println!("✓ Demande envoyée, transaction {id}");
        }

        Commands::Confirm { tx_id } => {
            ctx.reconciler.refresh().await?;
            let tx = ctx.controller.confirm(tx_id).await?;
            println!("✓ Transaction {} : {}", tx.id, tx.status.label());
            if tx.status == TransactionStatus::Processing {
                let text = instructions::deposit_instructions(tx.funds_in);
                if !text.is_empty() {
                    println!("\n{text}");
                }
            }
        }

        Commands::Cancel { tx_id } => {
            ctx.reconciler.refresh().await?;
            let tx = ctx.controller.cancel(tx_id).await?;
            println!("✓ Transaction {} : {}", tx.id, tx.status.label());
        }

        Commands::Deposit { tx_id, mint } => {
            ctx.reconciler.refresh().await?;
            if mint {
                match ctx.controller.mint_deposit(tx_id).await? {
                    SettlementOutcome::Confirmed { tx_hash } => {
                        println!("✓ Dépôt on-chain confirmé ({tx_hash})");
                    }
                    SettlementOutcome::Submitted { tx_hash } => {
                        println!("Dépôt soumis, confirmation en attente ({tx_hash})");
                    }
                    SettlementOutcome::Failed { reason } => {
                        println!("❌ Dépôt on-chain échoué : {reason}");
                    }
                }
            } else {
                let tx = ctx.controller.notify_deposit(tx_id).await?;
                println!("✓ Dépôt signalé, statut local : {}", tx.status.label());
            }
        }

        Commands::Settle { tx_id } => {
            ctx.reconciler.refresh().await?;
            match ctx.controller.settle(tx_id).await? {
                SettlementOutcome::Confirmed { tx_hash } => {
                    println!("✓ Transfert on-chain confirmé ({tx_hash})");
                }
                SettlementOutcome::Submitted { tx_hash } => {
                    println!("Transfert soumis, confirmation en attente ({tx_hash})");
                }
                SettlementOutcome::Failed { reason } => {
                    println!("❌ Règlement échoué : {reason}");
                }
            }
        }

        Commands::Onboard { phone } => {
            validation::validate_phone(&phone)?;
            let _ = ctx.reconciler.refresh().await;
            let telegram_user_id = ctx
                .store
                .user()
                .and_then(|u| u.telegram_user_id.clone());
            let url = ctx
                .api
                .request_onboarding(telegram_user_id.as_deref(), &phone)
                .await?;
            println!("Lien KYC : {url}");
        }

        Commands::RegisterWallet { address } => {
            validation::validate_evm_address(&address)?;
            let _ = ctx.reconciler.refresh().await;
            let telegram_user_id = ctx
                .store
                .user()
                .and_then(|u| u.telegram_user_id.clone());
            ctx.api
                .register_wallet(&address, telegram_user_id.as_deref())
                .await?;
            println!("✓ Portefeuille enregistré");
        }

        Commands::Watch => {
            let push = PushChannel::new(config.events_base(), session);
            let handle = Arc::clone(&ctx.reconciler).spawn(Some(push));
            println!("Surveillance en cours (Ctrl-C pour quitter)…");

            let mut last_seq = 0;
            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    _ = ticker.tick() => {
                        let seq = ctx.store.snapshot_seq();
                        if seq != last_seq {
                            last_seq = seq;
                            print_summary(&ctx);
                        }
                    }
                }
            }
            handle.shutdown().await;
        }

        Commands::Config => {
            config.validate()?;
            println!("Configuration:");
            println!("  API Base URL:    {}", config.api_base_url);
            println!("  Events Base URL: {}", config.events_base());
            println!("  Poll Interval:   {}s", config.poll_interval_secs);
            println!("  Chain RPC URL:   {}", config.chain_rpc_url);
            println!("  Token Contract:  {}", config.token_contract);
            println!("  Escrow Address:  {}", config.escrow_address);
            println!("  Session:         {}", session.masked());
            println!("✓ Configuration is valid");
        }
    }

    Ok(())
}

fn print_summary(ctx: &AppContext) {
    if let Some(user) = ctx.store.user() {
        println!(
            "KYC: {} | {}",
            user.kyc_status.label(),
            user.onboarding_step().label()
        );
    }
    for tx in ctx.store.transactions() {
        println!(
            "  {}  {}  {}{}  [{}]",
            tx.id,
            tx.created_at.format("%Y-%m-%d %H:%M"),
            tx.amount,
            tx.currency.symbol(),
            tx.status.label(),
        );
    }
}
