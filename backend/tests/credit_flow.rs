//! End-to-end exercise of the credit lifecycle against a fresh database:
//! initialize, spend, hit the insufficient-balance wall, admin correction,
//! and the audit trail left behind.

use shared::{AdminAdjustRequest, ConsumeRequest, InitializeRequest};
use toolhub_backend::db::DbConnection;
use toolhub_backend::domain::{CreditError, CreditService};
use toolhub_backend::identity::CallerIdentity;
use toolhub_backend::registry::{AppEntry, AppRegistry};

async fn service_with_allotment(allotment: i64) -> CreditService {
    let db = DbConnection::init_test().await.expect("test database");
    let registry = AppRegistry::from_entries([(
        "paco".to_string(),
        AppEntry {
            has_credits: true,
            monthly_allotment: allotment,
        },
    )]);
    CreditService::new(db, registry)
}

#[tokio::test]
async fn full_credit_lifecycle() {
    let service = service_with_allotment(50).await;
    let user = CallerIdentity::user("u1");
    let supervisor = CallerIdentity::supervisor("boss");

    // First touch creates the record with the app's allotment
    let initialized = service
        .initialize(
            Some(&user),
            InitializeRequest {
                app_id: "paco".to_string(),
            },
        )
        .await
        .unwrap();
    assert!(initialized.initialized);
    assert_eq!(initialized.data.balance, Some(50));

    // Spend within the balance
    let consumed = service
        .consume(
            Some(&user),
            ConsumeRequest {
                app_id: "paco".to_string(),
                amount: 10,
                reason: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(consumed.credits_remaining, 40);
    assert_eq!(consumed.total_used_this_month, 10);

    // Overspend is rejected and leaves the balance alone
    let rejected = service
        .consume(
            Some(&user),
            ConsumeRequest {
                app_id: "paco".to_string(),
                amount: 45,
                reason: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        rejected,
        CreditError::ResourceExhausted {
            requested: 45,
            available: 40
        }
    ));
    let read = service.read(Some(&user), "paco").await.unwrap();
    assert_eq!(read.data.as_ref().unwrap().balance, Some(40));

    // Administrative correction clamps at the zero floor
    let adjusted = service
        .admin_adjust(
            Some(&supervisor),
            AdminAdjustRequest {
                app_id: "paco".to_string(),
                target_user_id: "u1".to_string(),
                delta: -100,
                reason: Some("monthly reconciliation".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(adjusted.credits_before, 40);
    assert_eq!(adjusted.credits_after, 0);
    assert_eq!(adjusted.adjusted_by, "boss");

    let read = service.read(Some(&user), "paco").await.unwrap();
    assert!(read.exists);
    assert_eq!(read.data.as_ref().unwrap().balance, Some(0));
    assert_eq!(read.data.as_ref().unwrap().used_this_period, 10);

    // Exactly one ledger entry per committed mutation, newest first,
    // with the raw requested delta for the adjustment
    let history = service
        .ledger_history(Some(&supervisor), "paco", "u1", None)
        .await
        .unwrap();
    assert_eq!(history.entries.len(), 2);
    assert_eq!(history.entries[0].delta, -100);
    assert_eq!(history.entries[0].source, "admin");
    assert_eq!(history.entries[0].reason, "monthly reconciliation");
    assert_eq!(history.entries[0].actor_id, "boss");
    assert_eq!(history.entries[1].delta, -10);
    assert_eq!(history.entries[1].source, "consumption");
    assert_eq!(history.entries[1].actor_id, "u1");
}

#[tokio::test]
async fn balance_never_goes_negative() {
    let service = service_with_allotment(30).await;
    let user = CallerIdentity::user("u1");
    let supervisor = CallerIdentity::supervisor("boss");

    service
        .initialize(
            Some(&user),
            InitializeRequest {
                app_id: "paco".to_string(),
            },
        )
        .await
        .unwrap();

    // Mixed sequence of spends and corrections; balance must stay >= 0
    // after every committed step
    let steps: Vec<(&str, i64)> = vec![
        ("consume", 20),
        ("adjust", -50),
        ("adjust", 15),
        ("consume", 10),
        ("adjust", -1),
        ("consume", 4),
    ];

    for (op, value) in steps {
        let result = match op {
            "consume" => service
                .consume(
                    Some(&user),
                    ConsumeRequest {
                        app_id: "paco".to_string(),
                        amount: value,
                        reason: None,
                    },
                )
                .await
                .map(|_| ()),
            _ => service
                .admin_adjust(
                    Some(&supervisor),
                    AdminAdjustRequest {
                        app_id: "paco".to_string(),
                        target_user_id: "u1".to_string(),
                        delta: value,
                        reason: None,
                    },
                )
                .await
                .map(|_| ()),
        };
        // Consumes may be rejected; adjustments always succeed
        if op == "adjust" {
            result.unwrap();
        }

        let read = service.read(Some(&user), "paco").await.unwrap();
        let balance = read.data.unwrap().balance.unwrap();
        assert!(balance >= 0, "balance went negative: {balance}");
    }
}
