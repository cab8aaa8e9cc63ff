use std::fs;

use alloy::primitives::{address, b256, Address, U256};
use eyre::Result;
use tracing_test::traced_test;

use selene::consensus::Database as CheckpointDatabase;
use selene::prelude::*;

const CALLER: Address = address!("00000000000000000000000000000000000ca11e");
const TARGET: Address = address!("000000000000000000000000000000000000beef");

#[test]
fn test_config_drives_checkpoint_and_env() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("selene.toml");
    fs::write(
        &path,
        format!(
            "data_dir = {:?}\nchain_id = 11155111\nspec_id = \"cancun\"\n\
             default_checkpoint = \"0x{}\"\n",
            dir.path().join("data"),
            "11".repeat(32)
        ),
    )?;

    let config = Config::from_file(&path)?;
    assert_eq!(config.spec_id, SpecId::CANCUN);

    let db = FileDB::new(&config)?;
    assert_eq!(
        db.checkpoint_root()?,
        b256!("1111111111111111111111111111111111111111111111111111111111111111")
    );

    db.save_checkpoint(&[0x22; 32])?;
    assert_eq!(FileDB::new(&config)?.load_checkpoint()?, vec![0x22; 32]);
    assert_eq!(ConfigDB::new(&config)?.load_checkpoint()?, vec![0x11; 32]);

    let env = Env {
        cfg: CfgEnv::from(&config),
        ..Default::default()
    };
    let context = EvmContext::new_with_env(EmptyDB, Box::new(env), config.spec_id);
    assert_eq!(context.env().cfg.chain_id, 11155111);
    assert_eq!(context.spec_id(), SpecId::CANCUN);

    Ok(())
}

#[test]
#[traced_test]
fn test_transaction_round_trip() {
    let db = InMemoryDB::new().with_account(CALLER, AccountInfo::from_balance(U256::from(50)));
    let tx = TxEnv {
        caller: CALLER,
        transact_to: TransactTo::Call(TARGET),
        value: U256::from(20),
        ..Default::default()
    };
    let mut context = EvmContext::new_with_env(db, Box::new(Env::with_tx(tx)), SpecId::LATEST);
    context.warm_access_list();

    let inputs = CallInputs::new(&context.env.tx, 21_000).unwrap();
    let _outer = context.checkpoint();
    context
        .transfer(inputs.caller, inputs.target_address, inputs.call_value())
        .unwrap();
    context.tstore(TARGET, U256::from(1), U256::from(1));

    let nested = context.checkpoint();
    context.sstore(TARGET, U256::from(1), U256::from(5)).unwrap();
    context.checkpoint_revert(nested);
    context.checkpoint_commit();

    assert_eq!(context.tload(TARGET, U256::from(1)), U256::from(1));
    context.commit_transaction();

    assert_eq!(context.db.account(&CALLER).unwrap().info.balance, U256::from(30));
    assert_eq!(context.db.account(&TARGET).unwrap().info.balance, U256::from(20));
    assert_eq!(context.db.storage(&TARGET, &U256::from(1)), U256::ZERO);
    assert!(logs_contain("reverted checkpoint"));
    assert!(logs_contain("finalized transaction"));
}
