pub const CUSTOMER_REVIEW: &str = "
Your product is terrible! I don't know how
you were able to get this to the market.
I don't want this! Actually no one should want this.
Seriously! Give me money now!
";

pub const HAILSTORM_EMAIL: &str = "
Hi, I want to file a claim under my home insurance policy.
The recent hailstorm on July 12th in Austin, Texas damaged the roof and attic.
My policy number is H12345678TX. Let me know the next steps.
";

pub const FLOOD_EMAIL: &str = "
Subject: Insurance Claim Request
From: john.doe@example.com
Date: July 10, 2025

Hello Team,

There was a flood in our basement due to a pipe burst. The carpets are soaked and some electronics got damaged.
Please guide us on how to initiate a claim and what documents we need.

Regards,
John
";

pub const STORM_EMAIL: &str = "
Hi,

I recently experienced some storm damage to my roof and would like to file a claim under my homeowner's insurance policy.

The storm occurred on July 12th in Austin, Texas, and caused visible damage to the shingles and part of the attic. My policy number is H12345678TX.

Please let me know what documents I need to submit, and whether an adjuster will be visiting for inspection.

Thanks,
John Doe
";

pub const PHONE_REVIEW: &str = "
I recently bought this phone and the battery lasts only half a day.
The screen is bright and vibrant, but the customer service was terrible when I asked for help.
Also, the price feels too high for the features it offers.
";

pub const VACATION_EMAIL: &str = "
Here's our itinerary for our upcoming trip to Europe.
There will be 5 of us on this vacation trip.
We leave from Denver, Colorado airport at 8:45 pm, and arrive in Amsterdam 10 hours later
at Schipol Airport.
We'll grab a ride to our airbnb and maybe stop somewhere for breakfast before
taking a nap.

Some sightseeing will follow for a couple of hours.
We will then go shop for gifts
to bring back to our children and friends.

The next morning, at 7:45am we'll drive to to Belgium, Brussels - it should only take aroud 3 hours.
While in Brussels we want to explore the city to its fullest - no rock left unturned!
";

pub const EMAILS: [&str; 3] = [
    "Subject: Travel Itinerary\nFrom: alice@example.com\nDate: July 1, 2025\nWe are flying to Paris and Rome this summer vacation.",
    "Subject: Insurance Claim\nFrom: bob@insurance.com\nDate: July 3, 2025\nThere was a minor fire in the kitchen. We need to initiate a claim.",
    "Subject: Meeting Follow-up\nFrom: ceo@bigcorp.com\nDate: July 5, 2025\nThanks for attending. Next steps involve budget review and product roadmap.",
];
