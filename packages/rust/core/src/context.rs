use crate::gateway::Gateway;
use crate::options::AggregateOptions;
use crate::progress::ProgressReporter;
use crate::tag_cache::TagCache;

/// State shared by every branch of one aggregation run.
///
/// Built fresh per public call, so the tag cache never outlives the run that
/// filled it.
pub(crate) struct RunContext<'a> {
    pub(crate) gateway: &'a Gateway,
    pub(crate) options: &'a AggregateOptions,
    pub(crate) progress: &'a dyn ProgressReporter,
    pub(crate) tag_cache: Option<TagCache>,
}

impl<'a> RunContext<'a> {
    pub(crate) fn new(
        gateway: &'a Gateway,
        options: &'a AggregateOptions,
        progress: &'a dyn ProgressReporter,
    ) -> Self {
        Self {
            gateway,
            options,
            progress,
            tag_cache: options.dedupe_tags.then(TagCache::new),
        }
    }
}
