use std::sync::Arc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::error;

use crate::components::dashboard::{DashboardCanvas, DashboardConfig, DashboardError, DatasetBundle, load_bundle};

/// Loads every dataset, then hands the bundle to the dashboard.
#[component]
pub fn Home() -> impl IntoView {
	let config = DashboardConfig::default();
	let (bundle, set_bundle) = signal(None::<Result<Arc<DatasetBundle>, DashboardError>>);

	let load_config = config.clone();
	spawn_local(async move {
		let result = load_bundle(&load_config).await.map(Arc::new);
		if let Err(err) = &result {
			error!("{err}");
		}
		set_bundle.set(Some(result));
	});

	view! {
		<div class="dashboard-page">
			<h1>"COVID-19 Cases and Air Travel"</h1>
			{move || match bundle.get() {
				None => view! { <p class="loading">"Loading data..."</p> }.into_any(),
				Some(Err(err)) => {
					view! {
						<h2>"Uh oh! Something went wrong!"</h2>
						<p>{err.to_string()}</p>
					}
						.into_any()
				}
				Some(Ok(bundle)) => view! { <DashboardCanvas bundle=bundle config=config.clone() /> }.into_any(),
			}}
		</div>
	}
}
