use autoinject_target::{LabelSet, TargetItem};

use crate::{config::TargetHashArgs, error::CliResult};

pub(crate) fn target_item(args: &TargetHashArgs) -> TargetItem {
    let labels = args.labels.iter().cloned().collect::<LabelSet>();

    TargetItem::new(&*args.job, &*args.url, labels, &*args.collector)
}

pub(crate) fn print_hash(args: &TargetHashArgs) -> CliResult<()> {
    let item = target_item(args);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&item)?);
    } else {
        println!("{}", item.hash());
    }

    Ok(())
}
